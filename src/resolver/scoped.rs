//! Resolver view pinned to one version-correction.

use super::ComputationTargetResolver;
use crate::error::Result;
use crate::models::{ComputationTarget, TargetSpecification, VersionCorrection};
use crate::sources::{PositionSource, SecuritySource};
use std::sync::Arc;

/// Resolves every specification at the coordinate it was created with
///
/// "Latest" is fixed against the wall clock on creation, so every resolution
/// through one view sees the same snapshot and shares cache entries.
#[derive(Debug, Clone)]
pub struct AtVersionCorrectionResolver {
    underlying: Arc<dyn ComputationTargetResolver>,
    version_correction: VersionCorrection,
}

impl AtVersionCorrectionResolver {
    pub fn new(
        underlying: Arc<dyn ComputationTargetResolver>,
        version_correction: VersionCorrection,
    ) -> Self {
        Self {
            underlying,
            version_correction: version_correction.fixed_now(),
        }
    }

    pub fn version_correction(&self) -> VersionCorrection {
        self.version_correction
    }

    pub fn resolve(
        &self,
        specification: &Arc<TargetSpecification>,
    ) -> Result<Option<Arc<ComputationTarget>>> {
        self.underlying.resolve(specification, self.version_correction)
    }

    pub fn security_source(&self) -> Option<Arc<dyn SecuritySource>> {
        self.underlying.security_source()
    }

    pub fn position_source(&self) -> Option<Arc<dyn PositionSource>> {
        self.underlying.position_source()
    }
}
