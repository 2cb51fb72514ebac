//! # Deferred Backing-Store Writer
//!
//! Funnels backing store writes through a lock-free queue so that at most one
//! thread writes to the store at any time and no producer ever waits for it.
//!
//! ```text
//! submit(k, v)
//!   ├── acquire writer flag (CAS false -> true)
//!   │     ├── write own entry
//!   │     └── drain queue, release flag, re-check queue, re-acquire if needed
//!   └── flag busy
//!         ├── push to queue
//!         └── retry acquire once: the active writer may have just released
//! ```
//!
//! A thread that is itself inside a backing store write (serializing a
//! composite value can resolve and cache its children) has its writes
//! suppressed; those entries only reach the front caches.
//!
//! The writer flag is held by a [`WriterLease`] and released when the lease
//! drops, including while unwinding out of a panicking store. Entries still
//! queued at that point are drained by the next submitter.

use super::backing_store::BackingStore;
use super::ObjectCacheKey;
use crate::models::TargetValue;
use crossbeam::queue::SegQueue;
use std::cell::Cell;
use std::sync::atomic::{fence, AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{trace, warn};

thread_local! {
    static WRITING_BACKING_STORE: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is executing a backing store write
pub fn is_writing_on_current_thread() -> bool {
    WRITING_BACKING_STORE.with(Cell::get)
}

/// Marks the current thread as writing for the guard's lifetime
struct WritingGuard {
    previous: bool,
}

impl WritingGuard {
    fn enter() -> Self {
        let previous = WRITING_BACKING_STORE.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for WritingGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        WRITING_BACKING_STORE.with(|flag| flag.set(previous));
    }
}

/// Exclusive right to write to the store, released on drop
struct WriterLease<'a> {
    writer: &'a DeferredBackingWriter,
}

impl Drop for WriterLease<'_> {
    fn drop(&mut self) {
        self.writer.writer_active.store(false, Ordering::SeqCst);
        if thread::panicking() {
            warn!(
                store = self.writer.store.store_name(),
                pending = self.writer.queue.len(),
                "Backing store write panicked, writer released for the next submitter"
            );
        }
    }
}

/// How a submitted entry was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Written by the submitting thread, which then drained the queue
    Written,
    /// Left on the queue for the active writer
    Queued,
    /// Dropped because the submitting thread is already writing to the store
    Suppressed,
}

pub struct DeferredBackingWriter {
    store: Arc<dyn BackingStore>,
    queue: SegQueue<(ObjectCacheKey, Arc<TargetValue>)>,
    writer_active: AtomicBool,
    written: AtomicU64,
    suppressed: AtomicU64,
}

impl DeferredBackingWriter {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self {
            store,
            queue: SegQueue::new(),
            writer_active: AtomicBool::new(false),
            written: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    pub fn submit(&self, key: ObjectCacheKey, value: Arc<TargetValue>) -> SubmitOutcome {
        if is_writing_on_current_thread() {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            trace!(unique_id = %key.unique_id, "Suppressed reentrant backing store write");
            return SubmitOutcome::Suppressed;
        }

        if let Some(lease) = self.try_acquire() {
            self.write(key, value);
            self.drain_and_release(lease);
            return SubmitOutcome::Written;
        }

        self.queue.push((key, value));
        fence(Ordering::SeqCst);
        if let Some(lease) = self.try_acquire() {
            self.drain_and_release(lease);
        }
        SubmitOutcome::Queued
    }

    /// Drain pending entries on the calling thread if no other writer is active
    ///
    /// Returns the number of entries still pending afterwards.
    pub fn flush(&self) -> usize {
        if !is_writing_on_current_thread() {
            if let Some(lease) = self.try_acquire() {
                self.drain_and_release(lease);
            }
        }
        self.queue.len()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn suppressed_count(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    fn try_acquire(&self) -> Option<WriterLease<'_>> {
        self.writer_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| WriterLease { writer: self })
    }

    fn drain_and_release<'a>(&'a self, mut lease: WriterLease<'a>) {
        loop {
            let mut drained = 0usize;
            while let Some((key, value)) = self.queue.pop() {
                self.write(key, value);
                drained += 1;
            }
            drop(lease);
            fence(Ordering::SeqCst);
            if drained > 0 {
                trace!(drained, "Drained deferred backing store writes");
            }

            // an entry pushed after the last pop but before the release would
            // otherwise sit on the queue with no writer to take it
            if self.queue.is_empty() {
                break;
            }
            match self.try_acquire() {
                Some(next) => lease = next,
                None => break,
            }
        }
    }

    fn write(&self, key: ObjectCacheKey, value: Arc<TargetValue>) {
        let _guard = WritingGuard::enter();
        self.store.put(key, value);
        self.written.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for DeferredBackingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredBackingWriter")
            .field("store", &self.store.store_name())
            .field("pending", &self.queue.len())
            .field("writer_active", &self.writer_active.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backing_store::InMemoryBackingStore;
    use crate::models::{Primitive, UniqueId, VersionCorrection};
    use std::sync::Mutex;
    use std::thread;

    fn entry(id: usize) -> (ObjectCacheKey, Arc<TargetValue>) {
        let unique_id = UniqueId::of("Prim", id.to_string());
        (
            ObjectCacheKey::new(unique_id.clone(), VersionCorrection::LATEST),
            Arc::new(TargetValue::Primitive(Primitive::new(unique_id))),
        )
    }

    /// Records every put and fails if two threads are ever inside put together
    #[derive(Debug, Default)]
    struct RecordingStore {
        inside: AtomicBool,
        keys: Mutex<Vec<ObjectCacheKey>>,
    }

    impl BackingStore for RecordingStore {
        fn get(&self, _key: &ObjectCacheKey) -> Option<Arc<TargetValue>> {
            None
        }

        fn put(&self, key: ObjectCacheKey, _value: Arc<TargetValue>) {
            assert!(
                !self.inside.swap(true, Ordering::SeqCst),
                "concurrent backing store writes"
            );
            thread::yield_now();
            self.keys.lock().unwrap().push(key);
            self.inside.store(false, Ordering::SeqCst);
        }

        fn len(&self) -> usize {
            self.keys.lock().unwrap().len()
        }

        fn store_name(&self) -> &'static str {
            "recording"
        }
    }

    #[test]
    fn test_uncontended_submit_writes_immediately() {
        let store = Arc::new(InMemoryBackingStore::new(10));
        let writer = DeferredBackingWriter::new(store.clone());
        let (key, value) = entry(1);

        assert_eq!(writer.submit(key.clone(), value), SubmitOutcome::Written);
        assert!(store.contains(&key));
        assert_eq!(writer.pending(), 0);
        assert_eq!(writer.written_count(), 1);
    }

    #[test]
    fn test_reentrant_submit_is_suppressed() {
        let store = Arc::new(InMemoryBackingStore::new(10));
        let writer = DeferredBackingWriter::new(store.clone());
        let (key, value) = entry(2);

        let outcome = {
            let _guard = WritingGuard::enter();
            assert!(is_writing_on_current_thread());
            writer.submit(key.clone(), value)
        };
        assert!(!is_writing_on_current_thread());
        assert_eq!(outcome, SubmitOutcome::Suppressed);
        assert!(!store.contains(&key));
        assert_eq!(writer.suppressed_count(), 1);
    }

    /// Panics on its first put, then stores normally
    #[derive(Debug)]
    struct FailingOnceStore {
        failed: AtomicBool,
        inner: InMemoryBackingStore,
    }

    impl BackingStore for FailingOnceStore {
        fn get(&self, key: &ObjectCacheKey) -> Option<Arc<TargetValue>> {
            self.inner.get(key)
        }

        fn put(&self, key: ObjectCacheKey, value: Arc<TargetValue>) {
            if !self.failed.swap(true, Ordering::SeqCst) {
                panic!("backing store unavailable");
            }
            self.inner.put(key, value);
        }

        fn len(&self) -> usize {
            self.inner.len()
        }

        fn store_name(&self) -> &'static str {
            "failing_once"
        }
    }

    #[test]
    fn test_panicking_store_releases_writer() {
        let store = Arc::new(FailingOnceStore {
            failed: AtomicBool::new(false),
            inner: InMemoryBackingStore::new(10),
        });
        let writer = DeferredBackingWriter::new(store.clone());

        let (key, value) = entry(0);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            writer.submit(key, value)
        }));
        assert!(outcome.is_err());
        assert!(!is_writing_on_current_thread());

        for id in 1..=4 {
            let (key, value) = entry(id);
            assert_eq!(writer.submit(key, value), SubmitOutcome::Written);
        }
        assert_eq!(store.len(), 4);
        assert_eq!(writer.pending(), 0);
        assert_eq!(writer.flush(), 0);
    }

    #[test]
    fn test_entries_queued_during_outage_reach_next_writer() {
        let store = Arc::new(FailingOnceStore {
            failed: AtomicBool::new(false),
            inner: InMemoryBackingStore::new(10),
        });
        let writer = DeferredBackingWriter::new(store.clone());
        for id in 1..=3 {
            let (key, value) = entry(id);
            writer.queue.push((key, value));
        }

        let (key, value) = entry(0);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            writer.submit(key, value)
        }));
        assert!(outcome.is_err());
        assert_eq!(writer.pending(), 3);

        assert_eq!(writer.flush(), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_concurrent_submits_write_each_entry_exactly_once() {
        let store = Arc::new(RecordingStore::default());
        let writer = Arc::new(DeferredBackingWriter::new(store.clone()));
        let threads = 8;
        let per_thread = 200;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let writer = writer.clone();
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let (key, value) = entry(t * per_thread + i);
                        writer.submit(key, value);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(writer.pending(), 0);
        let mut ids: Vec<String> = store
            .keys
            .lock()
            .unwrap()
            .iter()
            .map(|k| k.unique_id.value().to_string())
            .collect();
        ids.sort();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, threads * per_thread);
        assert_eq!(ids.len(), threads * per_thread);
    }
}
