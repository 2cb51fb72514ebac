//! Fixture builders shared by the integration tests

#![allow(dead_code)] // Each test binary uses a different subset

use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use target_resolver::cache::{BackingStore, ObjectCacheKey};
use target_resolver::models::{
    ComputationTarget, Portfolio, PortfolioNode, Position, Security, TargetSpecification,
    TargetValue, Trade, UniqueId, VersionCorrection,
};
use target_resolver::resolver::{CachingTargetResolver, ComputationTargetResolver, DefaultTargetResolver};
use target_resolver::sources::{InMemoryPositionSource, InMemorySecuritySource};

/// A fixed coordinate so repeated resolutions share cache keys
pub fn pinned() -> VersionCorrection {
    VersionCorrection::fixed_at(Utc.with_ymd_and_hms(2024, 6, 30, 17, 0, 0).unwrap())
}

pub fn security_id(n: usize) -> UniqueId {
    UniqueId::of("TestSec", n.to_string())
}

pub fn security_spec(n: usize) -> Arc<TargetSpecification> {
    Arc::new(TargetSpecification::of_security(security_id(n)))
}

/// Securities, positions and one two-level portfolio behind in-memory sources
pub struct TestUniverse {
    pub securities: Arc<InMemorySecuritySource>,
    pub positions: Arc<InMemoryPositionSource>,
    pub security_count: usize,
}

impl TestUniverse {
    /// `security_count` securities, each held by one position with one trade
    pub fn new(security_count: usize) -> Self {
        let securities = Arc::new(InMemorySecuritySource::new());
        let positions = Arc::new(InMemoryPositionSource::new());

        let mut held = Vec::with_capacity(security_count);
        for n in 0..security_count {
            securities.put(
                Security::new(security_id(n), format!("Security {n}"), "EQUITY")
                    .with_attribute("currency", "USD"),
            );
            let trade = Arc::new(Trade {
                unique_id: UniqueId::of("TestTrd", n.to_string()),
                quantity: 10.0 * (n as f64 + 1.0),
                security_id: security_id(n),
                counterparty: "BROKER".to_string(),
                trade_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            });
            held.push(Arc::new(Position {
                unique_id: UniqueId::of("TestPos", n.to_string()),
                quantity: trade.quantity,
                security_id: security_id(n),
                trades: vec![trade],
            }));
        }

        let leaf = Arc::new(PortfolioNode {
            unique_id: UniqueId::of("TestNode", "leaf"),
            name: "Equities".to_string(),
            child_nodes: Vec::new(),
            positions: held,
        });
        positions.add_portfolio(Arc::new(Portfolio {
            unique_id: UniqueId::of("TestPrt", "main"),
            name: "Main Book".to_string(),
            root_node: Arc::new(PortfolioNode {
                unique_id: UniqueId::of("TestNode", "root"),
                name: "Root".to_string(),
                child_nodes: vec![leaf],
                positions: Vec::new(),
            }),
        }));

        Self {
            securities,
            positions,
            security_count,
        }
    }

    pub fn default_resolver(&self) -> DefaultTargetResolver {
        DefaultTargetResolver::default()
            .with_security_source(self.securities.clone())
            .with_position_source(self.positions.clone())
    }

    pub fn caching_resolver(&self, store: Arc<dyn BackingStore>) -> CachingTargetResolver {
        CachingTargetResolver::new(Arc::new(self.default_resolver()), store)
    }
}

/// Backing store that records every write and flags overlapping writers
///
/// Values are not retained, so the front caches only keep what callers hold.
#[derive(Debug, Default)]
pub struct RecordingBackingStore {
    writing: AtomicBool,
    overlapped: AtomicBool,
    writes: Mutex<Vec<ObjectCacheKey>>,
}

impl RecordingBackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<ObjectCacheKey> {
        self.writes.lock().unwrap().clone()
    }

    pub fn saw_overlapping_writers(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl BackingStore for RecordingBackingStore {
    fn get(&self, _key: &ObjectCacheKey) -> Option<Arc<TargetValue>> {
        None
    }

    fn put(&self, key: ObjectCacheKey, _value: Arc<TargetValue>) {
        if self.writing.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        std::thread::yield_now();
        self.writes.lock().unwrap().push(key);
        self.writing.store(false, Ordering::SeqCst);
    }

    fn len(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    fn store_name(&self) -> &'static str {
        "recording"
    }
}

/// Backing store whose writes resolve another target through the resolver
///
/// Mimics a store that serializes composite values and resolves their children
/// while doing so.
#[derive(Debug)]
pub struct ReentrantBackingStore {
    pub resolver: OnceLock<CachingTargetResolver>,
    child: Arc<TargetSpecification>,
    pub resolved_children: Mutex<Vec<Arc<ComputationTarget>>>,
    pub inner: RecordingBackingStore,
}

impl ReentrantBackingStore {
    pub fn new(child: Arc<TargetSpecification>) -> Self {
        Self {
            resolver: OnceLock::new(),
            child,
            resolved_children: Mutex::new(Vec::new()),
            inner: RecordingBackingStore::new(),
        }
    }
}

impl BackingStore for ReentrantBackingStore {
    fn get(&self, key: &ObjectCacheKey) -> Option<Arc<TargetValue>> {
        self.inner.get(key)
    }

    fn put(&self, key: ObjectCacheKey, value: Arc<TargetValue>) {
        let is_child = Some(&key.unique_id) == self.child.unique_id();
        if !is_child {
            if let Some(resolver) = self.resolver.get() {
                if let Ok(Some(child)) = resolver.resolve(&self.child, key.version_correction) {
                    self.resolved_children.lock().unwrap().push(child);
                }
            }
        }
        self.inner.put(key, value);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn store_name(&self) -> &'static str {
        "reentrant"
    }
}
