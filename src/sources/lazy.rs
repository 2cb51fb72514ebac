//! # Lazily Resolving Decorators
//!
//! Positions, trades and portfolio nodes reference their securities by id.
//! Resolving those eagerly would fetch every security underneath a portfolio
//! just to hand back the node, so the resolver wraps these values in
//! decorators that look the security up on first access and keep the answer.

use crate::models::{
    PortfolioNode, Position, Security, Trade, UniqueId, UniqueIdentifiable, VersionCorrection,
};
use crate::sources::traits::SecuritySource;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Where and as of when nested references are resolved
#[derive(Debug, Clone)]
pub struct LazyResolutionContext {
    security_source: Arc<dyn SecuritySource>,
    version_correction: VersionCorrection,
}

impl LazyResolutionContext {
    pub fn new(security_source: Arc<dyn SecuritySource>, version_correction: VersionCorrection) -> Self {
        Self {
            security_source,
            version_correction,
        }
    }

    pub fn version_correction(&self) -> VersionCorrection {
        self.version_correction
    }

    /// Same coordinate, linked securities looked up through `security_source`
    pub fn with_security_source(&self, security_source: Arc<dyn SecuritySource>) -> Self {
        Self::new(security_source, self.version_correction)
    }

    pub fn security_source(&self) -> &Arc<dyn SecuritySource> {
        &self.security_source
    }

    fn resolve_security(&self, security_id: &UniqueId) -> Option<Arc<Security>> {
        trace!(security_id = %security_id, "Lazily resolving linked security");
        self.security_source.get(security_id, self.version_correction)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LazyResolvedPosition {
    position: Arc<Position>,
    #[serde(skip)]
    context: LazyResolutionContext,
    #[serde(skip)]
    security: OnceLock<Option<Arc<Security>>>,
}

impl LazyResolvedPosition {
    pub fn new(position: Arc<Position>, context: LazyResolutionContext) -> Self {
        Self {
            position,
            context,
            security: OnceLock::new(),
        }
    }

    pub fn position(&self) -> &Arc<Position> {
        &self.position
    }

    pub fn context(&self) -> &LazyResolutionContext {
        &self.context
    }

    /// Unresolved copy that looks its security up in `context`
    pub fn with_context(&self, context: LazyResolutionContext) -> Self {
        Self::new(self.position.clone(), context)
    }

    pub fn quantity(&self) -> f64 {
        self.position.quantity
    }

    /// Held security, looked up on first call
    pub fn security(&self) -> Option<Arc<Security>> {
        self.security
            .get_or_init(|| self.context.resolve_security(&self.position.security_id))
            .clone()
    }

    pub fn is_security_resolved(&self) -> bool {
        self.security.get().is_some()
    }

    pub fn trades(&self) -> Vec<LazyResolvedTrade> {
        self.position
            .trades
            .iter()
            .map(|trade| LazyResolvedTrade::new(trade.clone(), self.context.clone()))
            .collect()
    }
}

impl UniqueIdentifiable for LazyResolvedPosition {
    fn unique_id(&self) -> &UniqueId {
        &self.position.unique_id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LazyResolvedTrade {
    trade: Arc<Trade>,
    #[serde(skip)]
    context: LazyResolutionContext,
    #[serde(skip)]
    security: OnceLock<Option<Arc<Security>>>,
}

impl LazyResolvedTrade {
    pub fn new(trade: Arc<Trade>, context: LazyResolutionContext) -> Self {
        Self {
            trade,
            context,
            security: OnceLock::new(),
        }
    }

    pub fn trade(&self) -> &Arc<Trade> {
        &self.trade
    }

    pub fn context(&self) -> &LazyResolutionContext {
        &self.context
    }

    pub fn with_context(&self, context: LazyResolutionContext) -> Self {
        Self::new(self.trade.clone(), context)
    }

    pub fn security(&self) -> Option<Arc<Security>> {
        self.security
            .get_or_init(|| self.context.resolve_security(&self.trade.security_id))
            .clone()
    }

    pub fn is_security_resolved(&self) -> bool {
        self.security.get().is_some()
    }
}

impl UniqueIdentifiable for LazyResolvedTrade {
    fn unique_id(&self) -> &UniqueId {
        &self.trade.unique_id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LazyResolvedPortfolioNode {
    node: Arc<PortfolioNode>,
    #[serde(skip)]
    context: LazyResolutionContext,
}

impl LazyResolvedPortfolioNode {
    pub fn new(node: Arc<PortfolioNode>, context: LazyResolutionContext) -> Self {
        Self { node, context }
    }

    pub fn node(&self) -> &Arc<PortfolioNode> {
        &self.node
    }

    pub fn context(&self) -> &LazyResolutionContext {
        &self.context
    }

    pub fn with_context(&self, context: LazyResolutionContext) -> Self {
        Self::new(self.node.clone(), context)
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn child_nodes(&self) -> Vec<LazyResolvedPortfolioNode> {
        self.node
            .child_nodes
            .iter()
            .map(|child| LazyResolvedPortfolioNode::new(child.clone(), self.context.clone()))
            .collect()
    }

    pub fn positions(&self) -> Vec<LazyResolvedPosition> {
        self.node
            .positions
            .iter()
            .map(|position| LazyResolvedPosition::new(position.clone(), self.context.clone()))
            .collect()
    }
}

impl UniqueIdentifiable for LazyResolvedPortfolioNode {
    fn unique_id(&self) -> &UniqueId {
        &self.node.unique_id
    }
}
