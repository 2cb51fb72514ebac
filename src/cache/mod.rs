//! # Resolution Caches
//!
//! Building blocks for the caching resolver:
//!
//! - [`WeakValueCache`] - front tier, holds values only while someone else does
//! - [`BackingStore`] - slow long-lived tier with in-memory and no-op providers
//! - [`DeferredBackingWriter`] - single-writer funnel into the backing store
//!
//! Both front caches and the backing store are keyed by a fixed
//! [`VersionCorrection`]; callers replace "latest" with the current instant
//! before building a key.

pub mod backing_store;
pub mod deferred_writer;
pub mod weak_cache;

pub use backing_store::{BackingStore, InMemoryBackingStore, NoOpBackingStore};
pub use deferred_writer::{is_writing_on_current_thread, DeferredBackingWriter, SubmitOutcome};
pub use weak_cache::WeakValueCache;

use crate::models::{TargetSpecification, UniqueId, VersionCorrection};
use std::sync::Arc;

/// Key of the object cache and the backing store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectCacheKey {
    pub unique_id: UniqueId,
    pub version_correction: VersionCorrection,
}

impl ObjectCacheKey {
    pub fn new(unique_id: UniqueId, version_correction: VersionCorrection) -> Self {
        Self {
            unique_id,
            version_correction,
        }
    }
}

/// Key of the target cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetCacheKey {
    pub specification: Arc<TargetSpecification>,
    pub version_correction: VersionCorrection,
}

impl TargetCacheKey {
    pub fn new(specification: Arc<TargetSpecification>, version_correction: VersionCorrection) -> Self {
        Self {
            specification,
            version_correction,
        }
    }
}
