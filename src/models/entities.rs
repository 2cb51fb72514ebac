//! Domain entities supplied by external sources.
//!
//! These are plain data; links to other entities (a position's security) are
//! held as identifiers and resolved lazily, see [`crate::sources::lazy`].

use super::unique_id::{UniqueId, UniqueIdentifiable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Opaque target that is nothing more than its identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Primitive {
    pub unique_id: UniqueId,
}

impl Primitive {
    pub fn new(unique_id: UniqueId) -> Self {
        Self { unique_id }
    }
}

impl UniqueIdentifiable for Primitive {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub unique_id: UniqueId,
    pub name: String,
    pub security_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Security {
    pub fn new(unique_id: UniqueId, name: impl Into<String>, security_type: impl Into<String>) -> Self {
        Self {
            unique_id,
            name: name.into(),
            security_type: security_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl UniqueIdentifiable for Security {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub unique_id: UniqueId,
    pub quantity: f64,
    /// Security traded, resolved on first access
    pub security_id: UniqueId,
    pub counterparty: String,
    pub trade_date: NaiveDate,
}

impl UniqueIdentifiable for Trade {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub unique_id: UniqueId,
    pub quantity: f64,
    /// Security held, resolved on first access
    pub security_id: UniqueId,
    #[serde(default)]
    pub trades: Vec<Arc<Trade>>,
}

impl UniqueIdentifiable for Position {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioNode {
    pub unique_id: UniqueId,
    pub name: String,
    #[serde(default)]
    pub child_nodes: Vec<Arc<PortfolioNode>>,
    #[serde(default)]
    pub positions: Vec<Arc<Position>>,
}

impl PortfolioNode {
    /// Depth-first walk over this node and all descendants
    pub fn walk(self: &Arc<Self>) -> Vec<Arc<PortfolioNode>> {
        let mut nodes = vec![self.clone()];
        for child in &self.child_nodes {
            nodes.extend(child.walk());
        }
        nodes
    }
}

impl UniqueIdentifiable for PortfolioNode {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

/// Named tree of portfolio nodes. Not itself a target type; its root node is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub unique_id: UniqueId,
    pub name: String,
    pub root_node: Arc<PortfolioNode>,
}

impl UniqueIdentifiable for Portfolio {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}
