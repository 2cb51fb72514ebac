//! Unique identifiers for resolvable entities.

use crate::error::{Result, TargetResolutionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

const SEPARATOR: char = '~';

/// Scheme-qualified identifier of an entity, optionally pinned to a version
///
/// String parts are reference counted so clones made while building cache
/// keys do not allocate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueId {
    scheme: Arc<str>,
    value: Arc<str>,
    version: Option<Arc<str>>,
}

impl UniqueId {
    /// Create an unversioned identifier
    pub fn of(scheme: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        Self {
            scheme: Arc::from(scheme.as_ref()),
            value: Arc::from(value.as_ref()),
            version: None,
        }
    }

    /// Create a new identifier with a random value in the given scheme
    pub fn generate(scheme: impl AsRef<str>) -> Self {
        Self::of(scheme, Uuid::new_v4().to_string())
    }

    /// Parse the `Scheme~Value[~Version]` string form
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split(SEPARATOR);
        let scheme = parts.next().filter(|s| !s.is_empty());
        let value = parts.next().filter(|s| !s.is_empty());
        let version = parts.next();

        match (scheme, value, parts.next()) {
            (Some(scheme), Some(value), None) => {
                let id = Self::of(scheme, value);
                Ok(match version {
                    Some(v) if !v.is_empty() => id.with_version(v),
                    _ => id,
                })
            }
            _ => Err(TargetResolutionError::InvalidSpecification {
                reason: format!("'{text}' is not a valid unique id"),
            }),
        }
    }

    pub fn with_version(&self, version: impl AsRef<str>) -> Self {
        Self {
            scheme: self.scheme.clone(),
            value: self.value.clone(),
            version: Some(Arc::from(version.as_ref())),
        }
    }

    /// The identifier with any version removed
    pub fn object_id(&self) -> Self {
        Self {
            scheme: self.scheme.clone(),
            value: self.value.clone(),
            version: None,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}{SEPARATOR}{}{SEPARATOR}{}", self.scheme, self.value, version),
            None => write!(f, "{}{SEPARATOR}{}", self.scheme, self.value),
        }
    }
}

/// Anything that carries a [`UniqueId`]
pub trait UniqueIdentifiable {
    fn unique_id(&self) -> &UniqueId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = UniqueId::of("Sec", "AAPL").with_version("3");
        assert_eq!(id.to_string(), "Sec~AAPL~3");
        assert_eq!(UniqueId::parse("Sec~AAPL~3").unwrap(), id);
        assert_eq!(UniqueId::parse("Sec~AAPL").unwrap(), id.object_id());
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        assert!(UniqueId::parse("").is_err());
        assert!(UniqueId::parse("Sec").is_err());
        assert!(UniqueId::parse("~AAPL").is_err());
        assert!(UniqueId::parse("a~b~c~d").is_err());
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = UniqueId::generate("Mem");
        let b = UniqueId::generate("Mem");
        assert_eq!(a.scheme(), "Mem");
        assert_ne!(a, b);
        assert!(!a.is_versioned());
    }
}
