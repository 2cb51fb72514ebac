//! Resolved computation targets.

use super::specification::TargetSpecification;
use super::unique_id::{UniqueId, UniqueIdentifiable};
use super::value::TargetValue;
use crate::error::{Result, TargetResolutionError};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static NULL_TARGET: OnceLock<Arc<ComputationTarget>> = OnceLock::new();

/// Zero marks "not computed yet"; a computed zero is remapped to this
const HASH_ZERO_REMAP: u64 = 0x9e37_79b9_7f4a_7c15;

/// A specification together with the value it resolved to
///
/// `value` is absent exactly when the specification is `NULL`. Otherwise the
/// value is compatible with the specification's type and carries the same
/// unique id.
pub struct ComputationTarget {
    specification: Arc<TargetSpecification>,
    value: Option<Arc<TargetValue>>,
    /// Racy cache: concurrent computations agree, so a plain store is enough
    hash: AtomicU64,
}

impl ComputationTarget {
    /// Shared `NULL` target
    pub fn null() -> Arc<ComputationTarget> {
        NULL_TARGET
            .get_or_init(|| {
                Arc::new(ComputationTarget {
                    specification: TargetSpecification::null(),
                    value: None,
                    hash: AtomicU64::new(0),
                })
            })
            .clone()
    }

    pub fn new(
        specification: Arc<TargetSpecification>,
        value: Arc<TargetValue>,
    ) -> Result<ComputationTarget> {
        if !specification.target_type().is_compatible_value(&value) {
            return Err(TargetResolutionError::InvalidTarget {
                reason: format!(
                    "{} value is not compatible with {}",
                    value.kind(),
                    specification
                ),
            });
        }
        if specification.unique_id() != Some(value.unique_id()) {
            return Err(TargetResolutionError::InvalidTarget {
                reason: format!(
                    "value id {} does not match {}",
                    value.unique_id(),
                    specification
                ),
            });
        }
        Ok(ComputationTarget {
            specification,
            value: Some(value),
            hash: AtomicU64::new(0),
        })
    }

    /// Build a target for a value found under `specification`'s id
    ///
    /// When the value carries a different id (a portfolio id resolved to its
    /// root node) the specification is re-pointed at the value's id.
    pub fn for_value(
        specification: &Arc<TargetSpecification>,
        value: Arc<TargetValue>,
    ) -> Result<ComputationTarget> {
        if specification.unique_id() == Some(value.unique_id()) {
            return Self::new(specification.clone(), value);
        }
        let repointed = crate::interning::normalize(Arc::new(
            specification.with_unique_id(value.unique_id().clone())?,
        ));
        Self::new(repointed, value)
    }

    pub fn specification(&self) -> &Arc<TargetSpecification> {
        &self.specification
    }

    pub fn value(&self) -> Option<&Arc<TargetValue>> {
        self.value.as_ref()
    }

    pub fn unique_id(&self) -> Option<&UniqueId> {
        self.specification.unique_id()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    fn cached_hash(&self) -> u64 {
        let current = self.hash.load(Ordering::Relaxed);
        if current != 0 {
            return current;
        }
        let mut hasher = DefaultHasher::new();
        self.specification.hash(&mut hasher);
        let computed = match hasher.finish() {
            0 => HASH_ZERO_REMAP,
            h => h,
        };
        self.hash.store(computed, Ordering::Relaxed);
        computed
    }
}

impl PartialEq for ComputationTarget {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.cached_hash() == other.cached_hash()
            && self.specification == other.specification
            && self.value.as_ref().map(|v| v.unique_id())
                == other.value.as_ref().map(|v| v.unique_id())
    }
}

impl Eq for ComputationTarget {}

impl Hash for ComputationTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

impl fmt::Debug for ComputationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputationTarget")
            .field("specification", &self.specification)
            .field("value", &self.value)
            .finish()
    }
}

impl fmt::Display for ComputationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CT[{}]", self.specification)
    }
}
