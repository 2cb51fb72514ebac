//! Backing store trait and providers
//!
//! The backing store is the slow, long-lived cache tier behind the weak front
//! caches. Reads are best-effort: a miss simply falls through to the inner
//! resolver. Writes arrive from a single thread at a time through
//! [`super::DeferredBackingWriter`].

use super::ObjectCacheKey;
use crate::models::TargetValue;
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub trait BackingStore: Send + Sync + Debug {
    /// `Some(value)` on hit, `None` on miss
    fn get(&self, key: &ObjectCacheKey) -> Option<Arc<TargetValue>>;

    fn put(&self, key: ObjectCacheKey, value: Arc<TargetValue>);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the store for diagnostics
    fn store_name(&self) -> &'static str;
}

/// Bounded map-backed store that keeps strong references
///
/// When full, an arbitrary resident entry is evicted to make room.
#[derive(Debug)]
pub struct InMemoryBackingStore {
    entries: DashMap<ObjectCacheKey, Arc<TargetValue>>,
    max_entries: usize,
    evictions: AtomicU64,
}

impl InMemoryBackingStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            evictions: AtomicU64::new(0),
        }
    }

    pub fn contains(&self, key: &ObjectCacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn eviction_count(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    fn evict_one(&self) {
        let victim = self.entries.iter().next().map(|entry| entry.key().clone());
        if let Some(victim) = victim {
            self.entries.remove(&victim);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(unique_id = %victim.unique_id, "Evicted backing store entry");
        }
    }
}

impl BackingStore for InMemoryBackingStore {
    fn get(&self, key: &ObjectCacheKey) -> Option<Arc<TargetValue>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: ObjectCacheKey, value: Arc<TargetValue>) {
        if self.max_entries == 0 {
            warn!("Backing store has zero capacity, dropping write");
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_one();
        }
        self.entries.insert(key, value);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn store_name(&self) -> &'static str {
        "in_memory"
    }
}

/// Store that never holds anything
///
/// All reads miss, all writes are discarded. Used when the backing tier is disabled.
#[derive(Debug, Clone, Default)]
pub struct NoOpBackingStore;

impl NoOpBackingStore {
    pub fn new() -> Self {
        Self
    }
}

impl BackingStore for NoOpBackingStore {
    fn get(&self, _key: &ObjectCacheKey) -> Option<Arc<TargetValue>> {
        None
    }

    fn put(&self, _key: ObjectCacheKey, _value: Arc<TargetValue>) {}

    fn len(&self) -> usize {
        0
    }

    fn store_name(&self) -> &'static str {
        "noop"
    }
}
