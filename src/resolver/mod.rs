//! # Target Resolvers
//!
//! Everything that turns a [`TargetSpecification`] into a [`ComputationTarget`]
//! implements [`ComputationTargetResolver`]:
//!
//! - [`DefaultTargetResolver`] - dispatches on the target type to external sources
//! - [`CachingTargetResolver`] - front caches, backing store and deferred writes around another resolver
//! - [`DelegatingTargetResolver`] - forwards every call, the base for decorators
//! - [`MapTargetResolver`] - serves targets registered up front
//!
//! [`AtVersionCorrectionResolver`] pins any of these to one coordinate.
//!
//! ## Outcomes
//!
//! | Result | Meaning |
//! |---|---|
//! | `Ok(Some(target))` | resolved; the `NULL` specification always yields the shared `NULL` target |
//! | `Ok(None)` | nothing exists at the coordinate, never cached |
//! | `Err(_)` | wiring or programming error, never downgraded to `Ok(None)` |

pub mod caching;
pub mod default;
pub mod delegating;
pub mod map;
pub mod scoped;

pub use caching::{CachingTargetResolver, ResolverCacheStats, WeakCachingTargetResolver};
pub use default::DefaultTargetResolver;
pub use delegating::DelegatingTargetResolver;
pub use map::MapTargetResolver;
pub use scoped::AtVersionCorrectionResolver;

use crate::error::Result;
use crate::models::{ComputationTarget, TargetSpecification, VersionCorrection};
use crate::sources::{PositionSource, SecuritySource};
use std::fmt::Debug;
use std::sync::Arc;

pub trait ComputationTargetResolver: Send + Sync + Debug {
    fn resolve(
        &self,
        specification: &Arc<TargetSpecification>,
        version_correction: VersionCorrection,
    ) -> Result<Option<Arc<ComputationTarget>>>;

    fn security_source(&self) -> Option<Arc<dyn SecuritySource>>;

    fn position_source(&self) -> Option<Arc<dyn PositionSource>>;

    /// View of this resolver pinned to `version_correction`
    fn at_version_correction(&self, version_correction: VersionCorrection)
        -> AtVersionCorrectionResolver;
}
