//! In-memory sources
//!
//! Map-backed implementations of the source traits for fixtures and
//! embedded use. Version-correction is ignored: the latest stored entity is
//! always returned. Each source counts its lookups so callers can observe
//! how often the caching layer actually reaches it.

use super::traits::{PositionSource, SecuritySource};
use crate::models::{
    Portfolio, PortfolioNode, Position, Security, Trade, UniqueId, VersionCorrection,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

pub const SECURITY_SCHEME: &str = "MemSec";

#[derive(Debug, Default)]
pub struct InMemorySecuritySource {
    securities: RwLock<HashMap<UniqueId, Arc<Security>>>,
    lookups: AtomicU64,
}

impl InMemorySecuritySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a security built around a freshly generated id
    pub fn add_security(&self, build: impl FnOnce(UniqueId) -> Security) -> UniqueId {
        let security = build(UniqueId::generate(SECURITY_SCHEME));
        let unique_id = security.unique_id.clone();
        self.put(security);
        unique_id
    }

    /// Insert or replace a security under its own id
    pub fn put(&self, security: Security) {
        debug!(security_id = %security.unique_id, "Storing in-memory security");
        self.securities
            .write()
            .insert(security.unique_id.clone(), Arc::new(security));
    }

    pub fn remove(&self, unique_id: &UniqueId) -> Option<Arc<Security>> {
        self.securities.write().remove(unique_id)
    }

    pub fn len(&self) -> usize {
        self.securities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.read().is_empty()
    }

    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl SecuritySource for InMemorySecuritySource {
    fn get(&self, unique_id: &UniqueId, _version_correction: VersionCorrection) -> Option<Arc<Security>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.securities.read().get(unique_id).cloned()
    }

    fn source_name(&self) -> &'static str {
        "in_memory"
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPositionSource {
    positions: RwLock<HashMap<UniqueId, Arc<Position>>>,
    trades: RwLock<HashMap<UniqueId, Arc<Trade>>>,
    nodes: RwLock<HashMap<UniqueId, Arc<PortfolioNode>>>,
    portfolios: RwLock<HashMap<UniqueId, Arc<Portfolio>>>,
    lookups: AtomicU64,
}

impl InMemoryPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a position and the trades it carries
    pub fn add_position(&self, position: Arc<Position>) {
        {
            let mut trades = self.trades.write();
            for trade in &position.trades {
                trades.insert(trade.unique_id.clone(), trade.clone());
            }
        }
        self.positions
            .write()
            .insert(position.unique_id.clone(), position);
    }

    pub fn add_trade(&self, trade: Arc<Trade>) {
        self.trades.write().insert(trade.unique_id.clone(), trade);
    }

    /// Store a portfolio and index every node, position and trade beneath it
    pub fn add_portfolio(&self, portfolio: Arc<Portfolio>) {
        let nodes = portfolio.root_node.walk();
        debug!(
            portfolio_id = %portfolio.unique_id,
            node_count = nodes.len(),
            "Indexing in-memory portfolio"
        );
        for node in nodes {
            for position in &node.positions {
                self.add_position(position.clone());
            }
            self.nodes.write().insert(node.unique_id.clone(), node);
        }
        self.portfolios
            .write()
            .insert(portfolio.unique_id.clone(), portfolio);
    }

    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    fn lookup<T>(&self, map: &RwLock<HashMap<UniqueId, Arc<T>>>, unique_id: &UniqueId) -> Option<Arc<T>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        map.read().get(unique_id).cloned()
    }
}

impl PositionSource for InMemoryPositionSource {
    fn get_position(&self, unique_id: &UniqueId, _vc: VersionCorrection) -> Option<Arc<Position>> {
        self.lookup(&self.positions, unique_id)
    }

    fn get_trade(&self, unique_id: &UniqueId, _vc: VersionCorrection) -> Option<Arc<Trade>> {
        self.lookup(&self.trades, unique_id)
    }

    fn get_portfolio_node(
        &self,
        unique_id: &UniqueId,
        _vc: VersionCorrection,
    ) -> Option<Arc<PortfolioNode>> {
        self.lookup(&self.nodes, unique_id)
    }

    fn get_portfolio(&self, unique_id: &UniqueId, _vc: VersionCorrection) -> Option<Arc<Portfolio>> {
        self.lookup(&self.portfolios, unique_id)
    }

    fn source_name(&self) -> &'static str {
        "in_memory"
    }
}
