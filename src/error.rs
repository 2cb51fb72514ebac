//! # Resolution Error Types
//!
//! Structured errors for the resolution layer. Only fatal conditions are
//! represented here: a target that does not exist at the requested coordinate
//! is reported as `Ok(None)` by every resolver and never becomes an error.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetResolutionError {
    /// A strategy needed a collaborator that was never configured.
    #[error("No {source_kind} source configured to resolve {target_type} targets")]
    SourceNotConfigured {
        source_kind: &'static str,
        target_type: String,
    },

    #[error("Unsupported target type: {target_type}")]
    UnsupportedTargetType { target_type: String },

    #[error("Invalid target specification: {reason}")]
    InvalidSpecification { reason: String },

    #[error("Invalid computation target: {reason}")]
    InvalidTarget { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl TargetResolutionError {
    /// True for errors caused by wiring or programming mistakes rather than data
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceNotConfigured { .. } | Self::UnsupportedTargetType { .. }
        )
    }
}

impl From<config::ConfigError> for TargetResolutionError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TargetResolutionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TargetResolutionError>;
