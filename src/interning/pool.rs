//! Weak-keyed set of canonical instances.

use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

pub const DEFAULT_PURGE_INTERVAL: usize = 4096;

/// Set of live instances bucketed by structural hash
///
/// The pool only holds weak references: once no caller keeps an instance
/// alive its slot is dead and is dropped on the next visit to the bucket or
/// the next periodic purge. Insertion is put-if-absent under the bucket's
/// shard lock, so concurrent callers interning equal values all receive the
/// same instance.
pub struct InstancePool<T> {
    name: &'static str,
    buckets: DashMap<u64, Vec<Weak<T>>>,
    inserts_since_purge: AtomicUsize,
    purge_interval: AtomicUsize,
}

impl<T> InstancePool<T>
where
    T: Eq + Hash + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self::with_purge_interval(name, DEFAULT_PURGE_INTERVAL)
    }

    pub fn with_purge_interval(name: &'static str, purge_interval: usize) -> Self {
        Self {
            name,
            buckets: DashMap::new(),
            inserts_since_purge: AtomicUsize::new(0),
            purge_interval: AtomicUsize::new(purge_interval.max(1)),
        }
    }

    /// Return the canonical instance equal to `value`, registering `value` if there is none
    pub fn intern(&self, value: Arc<T>) -> Arc<T> {
        let hash = structural_hash(&*value);

        if let Some(bucket) = self.buckets.get(&hash) {
            if let Some(existing) = find_live(&bucket, &value) {
                return existing;
            }
        }

        let inserted = {
            let mut bucket = self.buckets.entry(hash).or_default();
            bucket.retain(|slot| slot.strong_count() > 0);
            match find_live(&bucket, &value) {
                Some(existing) => return existing,
                None => {
                    bucket.push(Arc::downgrade(&value));
                    value
                }
            }
        };

        let inserts = self.inserts_since_purge.fetch_add(1, Ordering::Relaxed) + 1;
        if inserts >= self.purge_interval.load(Ordering::Relaxed) {
            self.purge();
        }
        inserted
    }

    /// Drop dead slots and empty buckets, returning the number of slots removed
    pub fn purge(&self) -> usize {
        self.inserts_since_purge.store(0, Ordering::Relaxed);
        let mut removed = 0;
        self.buckets.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|slot| slot.strong_count() > 0);
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        if removed > 0 {
            debug!(pool = self.name, removed, "Purged expired interned instances");
        } else {
            trace!(pool = self.name, "Interning pool purge found nothing to remove");
        }
        removed
    }

    /// Number of instances still alive
    pub fn live_count(&self) -> usize {
        self.buckets
            .iter()
            .map(|bucket| bucket.iter().filter(|slot| slot.strong_count() > 0).count())
            .sum()
    }

    pub fn set_purge_interval(&self, purge_interval: usize) {
        self.purge_interval
            .store(purge_interval.max(1), Ordering::Relaxed);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn structural_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn find_live<T: Eq>(bucket: &[Weak<T>], value: &Arc<T>) -> Option<Arc<T>> {
    bucket
        .iter()
        .filter_map(Weak::upgrade)
        .find(|candidate| Arc::ptr_eq(candidate, value) || **candidate == **value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_values_share_one_instance() {
        let pool = InstancePool::new("test");
        let a = pool.intern(Arc::new("alpha".to_string()));
        let b = pool.intern(Arc::new("alpha".to_string()));
        let c = pool.intern(Arc::new("beta".to_string()));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn test_interning_is_idempotent() {
        let pool = InstancePool::new("test");
        let a = pool.intern(Arc::new(42u64));
        let again = pool.intern(a.clone());
        assert!(Arc::ptr_eq(&a, &again));
    }

    #[test]
    fn test_dropped_instances_are_evicted() {
        let pool = InstancePool::new("test");
        drop(pool.intern(Arc::new(7u32)));

        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.purge(), 1);

        let fresh = Arc::new(7u32);
        let second = pool.intern(fresh.clone());
        assert!(Arc::ptr_eq(&second, &fresh));
    }

    #[test]
    fn test_periodic_purge_runs_after_interval() {
        let pool = InstancePool::with_purge_interval("test", 2);
        drop(pool.intern(Arc::new(1u8)));
        let kept = pool.intern(Arc::new(2u8));
        // second insert crossed the interval and swept the dead slot
        assert_eq!(pool.buckets.len(), 1);
        assert_eq!(pool.live_count(), 1);
        drop(kept);
    }
}
