//! Materialized target values.

use super::entities::{Primitive, Security};
use super::unique_id::{UniqueId, UniqueIdentifiable};
use crate::sources::lazy::{LazyResolvedPortfolioNode, LazyResolvedPosition, LazyResolvedTrade};
use crate::sources::SecuritySource;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Shape of a resolved value, used for type compatibility checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetValueKind {
    Primitive,
    Security,
    Position,
    Trade,
    PortfolioNode,
}

impl fmt::Display for TargetValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primitive => "primitive",
            Self::Security => "security",
            Self::Position => "position",
            Self::Trade => "trade",
            Self::PortfolioNode => "portfolio_node",
        };
        f.write_str(name)
    }
}

/// The object a specification resolves to
///
/// Shared as `Arc<TargetValue>` between the caller, the computation target
/// and the cache tiers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TargetValue {
    Primitive(Primitive),
    Security(Arc<Security>),
    Position(LazyResolvedPosition),
    Trade(LazyResolvedTrade),
    PortfolioNode(LazyResolvedPortfolioNode),
}

impl TargetValue {
    pub fn kind(&self) -> TargetValueKind {
        match self {
            Self::Primitive(_) => TargetValueKind::Primitive,
            Self::Security(_) => TargetValueKind::Security,
            Self::Position(_) => TargetValueKind::Position,
            Self::Trade(_) => TargetValueKind::Trade,
            Self::PortfolioNode(_) => TargetValueKind::PortfolioNode,
        }
    }

    /// Whether the value resolves linked securities lazily
    pub fn has_linked_securities(&self) -> bool {
        matches!(self, Self::Position(_) | Self::Trade(_) | Self::PortfolioNode(_))
    }

    /// Copy whose linked securities are looked up through `security_source`
    ///
    /// `None` for values without linked securities.
    pub fn with_security_source(&self, security_source: &Arc<dyn SecuritySource>) -> Option<Self> {
        match self {
            Self::Position(position) => Some(Self::Position(position.with_context(
                position.context().with_security_source(security_source.clone()),
            ))),
            Self::Trade(trade) => Some(Self::Trade(
                trade.with_context(trade.context().with_security_source(security_source.clone())),
            )),
            Self::PortfolioNode(node) => Some(Self::PortfolioNode(
                node.with_context(node.context().with_security_source(security_source.clone())),
            )),
            Self::Primitive(_) | Self::Security(_) => None,
        }
    }

    pub fn as_security(&self) -> Option<&Arc<Security>> {
        match self {
            Self::Security(security) => Some(security),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<&LazyResolvedPosition> {
        match self {
            Self::Position(position) => Some(position),
            _ => None,
        }
    }

    pub fn as_trade(&self) -> Option<&LazyResolvedTrade> {
        match self {
            Self::Trade(trade) => Some(trade),
            _ => None,
        }
    }

    pub fn as_portfolio_node(&self) -> Option<&LazyResolvedPortfolioNode> {
        match self {
            Self::PortfolioNode(node) => Some(node),
            _ => None,
        }
    }
}

impl UniqueIdentifiable for TargetValue {
    fn unique_id(&self) -> &UniqueId {
        match self {
            Self::Primitive(primitive) => primitive.unique_id(),
            Self::Security(security) => security.unique_id(),
            Self::Position(position) => position.unique_id(),
            Self::Trade(trade) => trade.unique_id(),
            Self::PortfolioNode(node) => node.unique_id(),
        }
    }
}
