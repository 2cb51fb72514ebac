//! # Target Model
//!
//! Immutable value types shared by every resolver:
//!
//! - [`TargetType`] - closed set of target type tags with multiple/nested combinators
//! - [`VersionCorrection`] - bitemporal lookup coordinate
//! - [`TargetSpecification`] - reference to a target, the canonical cache key
//! - [`ComputationTarget`] - a specification with its resolved value
//! - entities supplied by external sources ([`Security`], [`Position`], ...)

pub mod entities;
pub mod specification;
pub mod target;
pub mod target_type;
pub mod unique_id;
pub mod value;
pub mod value_requirement;
pub mod version_correction;

pub use entities::{Portfolio, PortfolioNode, Position, Primitive, Security, Trade};
pub use specification::TargetSpecification;
pub use target::ComputationTarget;
pub use target_type::TargetType;
pub use unique_id::{UniqueId, UniqueIdentifiable};
pub use value::{TargetValue, TargetValueKind};
pub use value_requirement::{
    ResolvedValueRequirement, ValueProperties, ValueRequirement, ValueSpecification,
};
pub use version_correction::VersionCorrection;
