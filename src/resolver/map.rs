//! Resolver over a map of pre-registered targets, ignoring version-correction.

use super::{AtVersionCorrectionResolver, ComputationTargetResolver};
use crate::error::Result;
use crate::models::{
    ComputationTarget, Primitive, TargetSpecification, TargetValue, UniqueId, VersionCorrection,
};
use crate::sources::{PositionSource, SecuritySource};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MapTargetResolver {
    targets: Arc<RwLock<HashMap<Arc<TargetSpecification>, Arc<ComputationTarget>>>>,
    security_source: Option<Arc<dyn SecuritySource>>,
    position_source: Option<Arc<dyn PositionSource>>,
}

impl MapTargetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_security_source(mut self, source: Arc<dyn SecuritySource>) -> Self {
        self.security_source = Some(source);
        self
    }

    pub fn with_position_source(mut self, source: Arc<dyn PositionSource>) -> Self {
        self.position_source = Some(source);
        self
    }

    /// Register `target` under its specification, replacing any previous entry
    pub fn add_target(&self, target: Arc<ComputationTarget>) {
        debug!(specification = %target.specification(), "Registering mapped target");
        self.targets
            .write()
            .insert(target.specification().clone(), target);
    }

    /// Register and return a primitive target for `unique_id`
    pub fn add_primitive(&self, unique_id: UniqueId) -> Result<Arc<ComputationTarget>> {
        let specification = Arc::new(TargetSpecification::of_primitive(unique_id.clone()));
        let value = Arc::new(TargetValue::Primitive(Primitive::new(unique_id)));
        let target = Arc::new(ComputationTarget::new(specification, value)?);
        self.add_target(target.clone());
        Ok(target)
    }

    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.read().is_empty()
    }
}

impl ComputationTargetResolver for MapTargetResolver {
    fn resolve(
        &self,
        specification: &Arc<TargetSpecification>,
        _version_correction: VersionCorrection,
    ) -> Result<Option<Arc<ComputationTarget>>> {
        if specification.is_null() {
            return Ok(Some(ComputationTarget::null()));
        }
        Ok(self.targets.read().get(specification).cloned())
    }

    fn security_source(&self) -> Option<Arc<dyn SecuritySource>> {
        self.security_source.clone()
    }

    fn position_source(&self) -> Option<Arc<dyn PositionSource>> {
        self.position_source.clone()
    }

    fn at_version_correction(&self, version_correction: VersionCorrection) -> AtVersionCorrectionResolver {
        AtVersionCorrectionResolver::new(Arc::new(self.clone()), version_correction)
    }
}
