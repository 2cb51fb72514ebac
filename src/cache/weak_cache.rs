//! Weak-valued concurrent map used for the front caches.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Concurrent map whose values are reclaimed once nobody else holds them
///
/// Readers upgrade to a temporary strong reference. Writers use
/// put-if-absent: the first live value under a key stays canonical and every
/// later writer is handed that value back instead of its own.
pub struct WeakValueCache<K, V> {
    name: &'static str,
    entries: DashMap<K, Weak<V>>,
    inserts_since_purge: AtomicUsize,
    purge_interval: usize,
}

impl<K, V> WeakValueCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(name: &'static str, purge_interval: usize) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            inserts_since_purge: AtomicUsize::new(0),
            purge_interval: purge_interval.max(1),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).and_then(|slot| slot.upgrade())
    }

    /// Insert `value` unless a live value is already present; returns the canonical value
    pub fn put_if_absent(&self, key: K, value: Arc<V>) -> Arc<V> {
        self.put_if_absent_where(key, value, |_| true)
    }

    /// Like [`put_if_absent`](Self::put_if_absent), but a live value rejected by
    /// `usable` counts as absent and is replaced
    pub fn put_if_absent_where(
        &self,
        key: K,
        value: Arc<V>,
        usable: impl Fn(&V) -> bool,
    ) -> Arc<V> {
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => match slot.get().upgrade() {
                Some(existing) if usable(&existing) => return existing,
                _ => {
                    slot.insert(Arc::downgrade(&value));
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(Arc::downgrade(&value));
            }
        }

        let inserts = self.inserts_since_purge.fetch_add(1, Ordering::Relaxed) + 1;
        if inserts >= self.purge_interval {
            self.purge_expired();
        }
        value
    }

    /// Remove entries whose value has been dropped
    pub fn purge_expired(&self) -> usize {
        self.inserts_since_purge.store(0, Ordering::Relaxed);
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.strong_count() > 0);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(cache = self.name, removed, "Purged expired front cache entries");
        }
        removed
    }

    /// Number of keys, including ones whose value has expired but not been purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|slot| slot.value().strong_count() > 0)
            .count()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
