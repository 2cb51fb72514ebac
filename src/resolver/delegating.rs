//! Resolver that forwards every call to another resolver.

use super::{AtVersionCorrectionResolver, ComputationTargetResolver};
use crate::error::Result;
use crate::models::{ComputationTarget, TargetSpecification, VersionCorrection};
use crate::sources::{PositionSource, SecuritySource};
use std::sync::Arc;

/// Base for decorators that override only some operations
#[derive(Debug, Clone)]
pub struct DelegatingTargetResolver {
    underlying: Arc<dyn ComputationTargetResolver>,
}

impl DelegatingTargetResolver {
    pub fn new(underlying: Arc<dyn ComputationTargetResolver>) -> Self {
        Self { underlying }
    }

    pub fn underlying(&self) -> &Arc<dyn ComputationTargetResolver> {
        &self.underlying
    }
}

impl ComputationTargetResolver for DelegatingTargetResolver {
    fn resolve(
        &self,
        specification: &Arc<TargetSpecification>,
        version_correction: VersionCorrection,
    ) -> Result<Option<Arc<ComputationTarget>>> {
        self.underlying.resolve(specification, version_correction)
    }

    fn security_source(&self) -> Option<Arc<dyn SecuritySource>> {
        self.underlying.security_source()
    }

    fn position_source(&self) -> Option<Arc<dyn PositionSource>> {
        self.underlying.position_source()
    }

    fn at_version_correction(&self, version_correction: VersionCorrection) -> AtVersionCorrectionResolver {
        self.underlying.at_version_correction(version_correction)
    }
}
