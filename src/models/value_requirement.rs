//! Value requirements and specifications carried on graph edges.
//!
//! These are the other heavily duplicated reference values alongside target
//! specifications; all of them are interned.

use super::specification::TargetSpecification;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Named property constraints; an empty value set means "any value"
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueProperties {
    properties: BTreeMap<String, BTreeSet<String>>,
}

impl ValueProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .entry(name.into())
            .or_default()
            .insert(value.into());
        self
    }

    pub fn with_any(mut self, name: impl Into<String>) -> Self {
        self.properties.insert(name.into(), BTreeSet::new());
        self
    }

    pub fn values(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.properties.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// True when every constraint in `self` is met by `other`
    pub fn is_satisfied_by(&self, other: &ValueProperties) -> bool {
        self.properties.iter().all(|(name, required)| {
            other.properties.get(name).is_some_and(|offered| {
                required.is_empty() || offered.is_empty() || !required.is_disjoint(offered)
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueRequirement {
    pub value_name: String,
    pub target: Arc<TargetSpecification>,
    pub constraints: Arc<ValueProperties>,
}

impl ValueRequirement {
    pub fn new(
        value_name: impl Into<String>,
        target: Arc<TargetSpecification>,
        constraints: Arc<ValueProperties>,
    ) -> Self {
        Self {
            value_name: value_name.into(),
            target,
            constraints,
        }
    }
}

impl fmt::Display for ValueRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VReq[{}, {}]", self.value_name, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueSpecification {
    pub value_name: String,
    pub target: Arc<TargetSpecification>,
    pub properties: Arc<ValueProperties>,
}

impl ValueSpecification {
    pub fn new(
        value_name: impl Into<String>,
        target: Arc<TargetSpecification>,
        properties: Arc<ValueProperties>,
    ) -> Self {
        Self {
            value_name: value_name.into(),
            target,
            properties,
        }
    }

    pub fn satisfies(&self, requirement: &ValueRequirement) -> bool {
        self.value_name == requirement.value_name
            && self.target == requirement.target
            && requirement.constraints.is_satisfied_by(&self.properties)
    }
}

/// A requirement paired with the specification chosen to satisfy it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedValueRequirement {
    pub requirement: Arc<ValueRequirement>,
    pub specification: Arc<ValueSpecification>,
}

impl ResolvedValueRequirement {
    pub fn new(requirement: Arc<ValueRequirement>, specification: Arc<ValueSpecification>) -> Self {
        Self {
            requirement,
            specification,
        }
    }
}
