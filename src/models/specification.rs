//! # Target Specifications
//!
//! Immutable, serializable references to targets. A specification is the
//! canonical cache key for a resolution request and the payload carried by
//! dependency graph edges, so equal specifications are expected to be
//! collapsed to one instance through [`crate::interning`].

use super::target_type::TargetType;
use super::unique_id::UniqueId;
use crate::error::{Result, TargetResolutionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

static NULL_SPECIFICATION: OnceLock<Arc<TargetSpecification>> = OnceLock::new();

/// `{ type, unique id, parent }`, compared and hashed by value including the parent chain
///
/// The unique id is absent exactly when the type is `Null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SpecificationParts")]
pub struct TargetSpecification {
    target_type: TargetType,
    unique_id: Option<Arc<UniqueId>>,
    parent: Option<Arc<TargetSpecification>>,
}

/// Wire shape, validated through [`TargetSpecification::from_parts`]
#[derive(Deserialize)]
struct SpecificationParts {
    target_type: TargetType,
    unique_id: Option<UniqueId>,
    parent: Option<Arc<TargetSpecification>>,
}

impl TryFrom<SpecificationParts> for TargetSpecification {
    type Error = TargetResolutionError;

    fn try_from(parts: SpecificationParts) -> Result<Self> {
        Self::from_parts(parts.target_type, parts.unique_id, parts.parent)
    }
}

impl TargetSpecification {
    pub const NULL: TargetSpecification = TargetSpecification {
        target_type: TargetType::Null,
        unique_id: None,
        parent: None,
    };

    /// Shared instance of the `NULL` specification
    pub fn null() -> Arc<TargetSpecification> {
        NULL_SPECIFICATION
            .get_or_init(|| Arc::new(Self::NULL))
            .clone()
    }

    /// Create a specification, rejecting a `Null` type paired with an id
    pub fn new(target_type: TargetType, unique_id: UniqueId) -> Result<Self> {
        if target_type.is_null() {
            return Err(TargetResolutionError::InvalidSpecification {
                reason: format!("NULL specification cannot carry unique id {unique_id}"),
            });
        }
        Ok(Self::leaf(target_type, unique_id))
    }

    /// Build from parts, enforcing the id/`Null` invariant in both directions
    pub fn from_parts(
        target_type: TargetType,
        unique_id: Option<UniqueId>,
        parent: Option<Arc<TargetSpecification>>,
    ) -> Result<Self> {
        if target_type.is_null() {
            if unique_id.is_none() && parent.is_none() {
                return Ok(Self::NULL);
            }
            return Err(TargetResolutionError::InvalidSpecification {
                reason: "NULL specification cannot carry an id or parent".to_string(),
            });
        }
        match unique_id {
            Some(unique_id) => Ok(Self {
                target_type,
                unique_id: Some(Arc::new(unique_id)),
                parent,
            }),
            None => Err(TargetResolutionError::InvalidSpecification {
                reason: format!("{target_type} specification requires a unique id"),
            }),
        }
    }

    pub fn of_primitive(unique_id: UniqueId) -> Self {
        Self::leaf(TargetType::Primitive, unique_id)
    }

    pub fn of_security(unique_id: UniqueId) -> Self {
        Self::leaf(TargetType::Security, unique_id)
    }

    pub fn of_position(unique_id: UniqueId) -> Self {
        Self::leaf(TargetType::Position, unique_id)
    }

    pub fn of_trade(unique_id: UniqueId) -> Self {
        Self::leaf(TargetType::Trade, unique_id)
    }

    pub fn of_portfolio_node(unique_id: UniqueId) -> Self {
        Self::leaf(TargetType::PortfolioNode, unique_id)
    }

    fn leaf(target_type: TargetType, unique_id: UniqueId) -> Self {
        Self {
            target_type,
            unique_id: Some(Arc::new(unique_id)),
            parent: None,
        }
    }

    /// Reference to `unique_id` reached through this target, e.g. the security of a position
    pub fn containing(
        self: &Arc<Self>,
        target_type: TargetType,
        unique_id: UniqueId,
    ) -> Result<Self> {
        if self.is_null() || target_type.is_null() {
            return Err(TargetResolutionError::InvalidSpecification {
                reason: "NULL cannot take part in a containment chain".to_string(),
            });
        }
        Ok(Self {
            target_type: self.target_type.containing(target_type),
            unique_id: Some(Arc::new(unique_id)),
            parent: Some(self.clone()),
        })
    }

    /// Same reference pointing at a different id
    pub fn with_unique_id(&self, unique_id: UniqueId) -> Result<Self> {
        Self::from_parts(
            self.target_type.clone(),
            Some(unique_id),
            self.parent.clone(),
        )
    }

    pub fn target_type(&self) -> &TargetType {
        &self.target_type
    }

    pub fn unique_id(&self) -> Option<&UniqueId> {
        self.unique_id.as_deref()
    }

    pub(crate) fn shared_unique_id(&self) -> Option<&Arc<UniqueId>> {
        self.unique_id.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<TargetSpecification>> {
        self.parent.as_ref()
    }

    pub fn is_null(&self) -> bool {
        self.target_type.is_null()
    }

    /// Rebuild with replacement components; used by interning
    pub(crate) fn with_components(
        &self,
        unique_id: Option<Arc<UniqueId>>,
        parent: Option<Arc<TargetSpecification>>,
    ) -> Self {
        Self {
            target_type: self.target_type.clone(),
            unique_id,
            parent,
        }
    }
}

impl fmt::Display for TargetSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unique_id {
            Some(id) => write!(f, "CTSpec[{}, {}]", self.target_type, id)?,
            None => write!(f, "CTSpec[{}]", self.target_type)?,
        }
        if let Some(parent) = &self.parent {
            write!(f, " in {parent}")?;
        }
        Ok(())
    }
}
