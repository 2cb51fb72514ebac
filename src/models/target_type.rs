//! # Target Types
//!
//! Closed set of target type tags plus the two structural combinators.
//!
//! ```text
//! TargetType
//! ├── Primitive | Security | Position | Trade | PortfolioNode | Null
//! ├── Multiple([..])   any one of several alternatives
//! └── Nested([..])     reached by walking through containing objects, leaf last
//! ```
//!
//! Compatibility answers "may a value of this shape stand in where the
//! required type is expected". `Primitive` accepts every value; combinators
//! flatten to their members (multiple) or their leaf (nested).

use super::value::{TargetValue, TargetValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Primitive,
    Security,
    Position,
    Trade,
    PortfolioNode,
    Null,
    Multiple(Vec<TargetType>),
    Nested(Vec<TargetType>),
}

impl TargetType {
    /// Alternatives, flattened and de-duplicated. A single alternative collapses to itself.
    pub fn multiple(types: impl IntoIterator<Item = TargetType>) -> Self {
        let mut members: Vec<TargetType> = Vec::new();
        for target_type in types {
            let flattened = match target_type {
                TargetType::Multiple(inner) => inner,
                other => vec![other],
            };
            for member in flattened {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }
        if members.len() == 1 {
            members.remove(0)
        } else {
            TargetType::Multiple(members)
        }
    }

    /// Containment chain, outermost first. Nested chains are spliced in place.
    pub fn nested(types: impl IntoIterator<Item = TargetType>) -> Self {
        let mut chain: Vec<TargetType> = Vec::new();
        for target_type in types {
            match target_type {
                TargetType::Nested(inner) => chain.extend(inner),
                other => chain.push(other),
            }
        }
        if chain.len() == 1 {
            chain.remove(0)
        } else {
            TargetType::Nested(chain)
        }
    }

    /// This type reached through `self` as the containing type
    pub fn containing(&self, inner: TargetType) -> Self {
        Self::nested([self.clone(), inner])
    }

    /// The type a nested chain ultimately resolves to; other types are their own leaf
    pub fn leaf(&self) -> Option<&TargetType> {
        match self {
            TargetType::Nested(chain) => chain.last().and_then(TargetType::leaf),
            other => Some(other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TargetType::Null)
    }

    /// Can `value` be supplied where this type is required?
    pub fn is_compatible_value(&self, value: &TargetValue) -> bool {
        self.accepts_kind(value.kind())
    }

    /// Can a value satisfying `other` be supplied where this type is required?
    pub fn is_compatible_type(&self, other: &TargetType) -> bool {
        match other {
            TargetType::Multiple(members) => {
                !members.is_empty() && members.iter().all(|m| self.is_compatible_type(m))
            }
            TargetType::Nested(_) => other
                .leaf()
                .is_some_and(|leaf| self.is_compatible_type(leaf)),
            TargetType::Null => self.is_null(),
            leaf => match leaf.value_kind() {
                Some(kind) => self.accepts_kind(kind),
                None => false,
            },
        }
    }

    fn accepts_kind(&self, kind: TargetValueKind) -> bool {
        match self {
            TargetType::Primitive => true,
            TargetType::Null => false,
            TargetType::Multiple(members) => members.iter().any(|m| m.accepts_kind(kind)),
            TargetType::Nested(_) => self.leaf().is_some_and(|leaf| leaf.accepts_kind(kind)),
            leaf => leaf.value_kind() == Some(kind),
        }
    }

    fn value_kind(&self) -> Option<TargetValueKind> {
        match self {
            TargetType::Primitive => Some(TargetValueKind::Primitive),
            TargetType::Security => Some(TargetValueKind::Security),
            TargetType::Position => Some(TargetValueKind::Position),
            TargetType::Trade => Some(TargetValueKind::Trade),
            TargetType::PortfolioNode => Some(TargetValueKind::PortfolioNode),
            _ => None,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[TargetType], sep: &str| {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(sep)
        };
        match self {
            TargetType::Primitive => write!(f, "PRIMITIVE"),
            TargetType::Security => write!(f, "SECURITY"),
            TargetType::Position => write!(f, "POSITION"),
            TargetType::Trade => write!(f, "TRADE"),
            TargetType::PortfolioNode => write!(f, "PORTFOLIO_NODE"),
            TargetType::Null => write!(f, "NULL"),
            TargetType::Multiple(members) => write!(f, "({})", join(members, "|")),
            TargetType::Nested(chain) => write!(f, "{}", join(chain, "/")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_accepts_everything() {
        for other in [
            TargetType::Security,
            TargetType::Position,
            TargetType::Trade,
            TargetType::PortfolioNode,
            TargetType::Primitive,
        ] {
            assert!(TargetType::Primitive.is_compatible_type(&other));
        }
        assert!(!TargetType::Security.is_compatible_type(&TargetType::Primitive));
    }

    #[test]
    fn test_multiple_flattens_and_collapses() {
        let single = TargetType::multiple([TargetType::Security, TargetType::Security]);
        assert_eq!(single, TargetType::Security);

        let many = TargetType::multiple([
            TargetType::Security,
            TargetType::multiple([TargetType::Trade, TargetType::Security]),
        ]);
        assert_eq!(
            many,
            TargetType::Multiple(vec![TargetType::Security, TargetType::Trade])
        );
        assert_eq!(many.to_string(), "(SECURITY|TRADE)");
    }

    #[test]
    fn test_nested_leaf_drives_compatibility() {
        let security_of_position = TargetType::Position.containing(TargetType::Security);
        assert_eq!(security_of_position.leaf(), Some(&TargetType::Security));
        assert_eq!(security_of_position.to_string(), "POSITION/SECURITY");
        assert!(TargetType::Security.is_compatible_type(&security_of_position));
        assert!(security_of_position.is_compatible_type(&TargetType::Security));
        assert!(!TargetType::Position.is_compatible_type(&security_of_position));
    }

    #[test]
    fn test_multiple_requirement_accepts_any_member() {
        let either = TargetType::multiple([TargetType::Position, TargetType::Trade]);
        assert!(either.is_compatible_type(&TargetType::Trade));
        assert!(!either.is_compatible_type(&TargetType::Security));
        assert!(!TargetType::Trade.is_compatible_type(&either));
    }

    #[test]
    fn test_null_only_matches_null() {
        assert!(TargetType::Null.is_compatible_type(&TargetType::Null));
        assert!(!TargetType::Primitive.is_compatible_type(&TargetType::Null));
        assert!(!TargetType::Null.is_compatible_type(&TargetType::Security));
    }
}
