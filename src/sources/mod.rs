//! # Entity Sources
//!
//! External collaborators that supply raw entities, plus the adapters the
//! resolvers layer on top of them.
//!
//! - [`traits`] - [`SecuritySource`] and [`PositionSource`]
//! - [`in_memory`] - map-backed sources
//! - [`lazy`] - decorators that resolve linked securities on first access
//! - [`cached`] - sources that answer through a caching resolver

pub mod cached;
pub mod in_memory;
pub mod lazy;
pub mod traits;

pub use cached::{CachingPositionSource, CachingSecuritySource, LinkedSecuritySource};
pub use in_memory::{InMemoryPositionSource, InMemorySecuritySource};
pub use lazy::{
    LazyResolutionContext, LazyResolvedPortfolioNode, LazyResolvedPosition, LazyResolvedTrade,
};
pub use traits::{PositionSource, SecuritySource};
