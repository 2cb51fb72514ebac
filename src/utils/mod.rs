//! Shared utilities.

pub mod size_estimator;

pub use size_estimator::{estimate_size, estimate_target_size};
