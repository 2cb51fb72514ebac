//! # Instance Interning
//!
//! Process-wide pools that collapse structurally equal reference values into
//! one shared instance.
//!
//! ## Normalization
//!
//! [`normalize`] works bottom-up: a compound value first normalizes its
//! component fields, rebuilding itself only when a component was replaced,
//! and then looks itself up in its type's pool. Two equal graphs built from
//! unrelated allocations therefore converge on literally the same instance,
//! and the number of live instances is bounded by the number of distinct
//! values rather than the number of references.
//!
//! ```rust
//! use std::sync::Arc;
//! use target_resolver::interning::normalize;
//! use target_resolver::models::{TargetSpecification, UniqueId};
//!
//! let a = normalize(Arc::new(TargetSpecification::of_security(UniqueId::of("Sec", "AAPL"))));
//! let b = normalize(Arc::new(TargetSpecification::of_security(UniqueId::of("Sec", "AAPL"))));
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

pub mod pool;

pub use pool::InstancePool;

use crate::config::ResolverCacheConfig;
use crate::models::{
    ResolvedValueRequirement, TargetSpecification, UniqueId, ValueProperties, ValueRequirement,
    ValueSpecification,
};
use std::hash::Hash;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// A value type with a process-wide interning pool
pub trait Internable: Eq + Hash + Send + Sync + Sized + 'static {
    fn pool() -> &'static InstancePool<Self>;

    /// Copy of `self` with normalized components, or `None` when every
    /// component is already canonical
    fn normalize_components(&self) -> Option<Self> {
        None
    }
}

/// Canonical instance structurally equal to `value`
pub fn normalize<T: Internable>(value: Arc<T>) -> Arc<T> {
    let value = match value.normalize_components() {
        Some(rebuilt) => Arc::new(rebuilt),
        None => value,
    };
    T::pool().intern(value)
}

fn normalize_field<T: Internable>(field: &Arc<T>) -> (Arc<T>, bool) {
    let canonical = normalize(field.clone());
    let changed = !Arc::ptr_eq(&canonical, field);
    (canonical, changed)
}

macro_rules! global_pool {
    ($ty:ty, $name:literal) => {{
        static POOL: OnceLock<InstancePool<$ty>> = OnceLock::new();
        POOL.get_or_init(|| InstancePool::new($name))
    }};
}

impl Internable for UniqueId {
    fn pool() -> &'static InstancePool<Self> {
        global_pool!(UniqueId, "unique_id")
    }
}

impl Internable for ValueProperties {
    fn pool() -> &'static InstancePool<Self> {
        global_pool!(ValueProperties, "value_properties")
    }
}

impl Internable for TargetSpecification {
    fn pool() -> &'static InstancePool<Self> {
        global_pool!(TargetSpecification, "target_specification")
    }

    fn normalize_components(&self) -> Option<Self> {
        let (unique_id, id_changed) = match self.shared_unique_id() {
            Some(id) => {
                let (canonical, changed) = normalize_field(id);
                (Some(canonical), changed)
            }
            None => (None, false),
        };
        let (parent, parent_changed) = match self.parent() {
            Some(parent) => {
                let (canonical, changed) = normalize_field(parent);
                (Some(canonical), changed)
            }
            None => (None, false),
        };
        (id_changed || parent_changed).then(|| self.with_components(unique_id, parent))
    }
}

impl Internable for ValueRequirement {
    fn pool() -> &'static InstancePool<Self> {
        global_pool!(ValueRequirement, "value_requirement")
    }

    fn normalize_components(&self) -> Option<Self> {
        let (target, target_changed) = normalize_field(&self.target);
        let (constraints, constraints_changed) = normalize_field(&self.constraints);
        (target_changed || constraints_changed)
            .then(|| ValueRequirement::new(self.value_name.clone(), target, constraints))
    }
}

impl Internable for ValueSpecification {
    fn pool() -> &'static InstancePool<Self> {
        global_pool!(ValueSpecification, "value_specification")
    }

    fn normalize_components(&self) -> Option<Self> {
        let (target, target_changed) = normalize_field(&self.target);
        let (properties, properties_changed) = normalize_field(&self.properties);
        (target_changed || properties_changed)
            .then(|| ValueSpecification::new(self.value_name.clone(), target, properties))
    }
}

impl Internable for ResolvedValueRequirement {
    fn pool() -> &'static InstancePool<Self> {
        global_pool!(ResolvedValueRequirement, "resolved_value_requirement")
    }

    fn normalize_components(&self) -> Option<Self> {
        let (requirement, requirement_changed) = normalize_field(&self.requirement);
        let (specification, specification_changed) = normalize_field(&self.specification);
        (requirement_changed || specification_changed)
            .then(|| ResolvedValueRequirement::new(requirement, specification))
    }
}

/// Live instance counts per global pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterningStats {
    pub unique_ids: usize,
    pub target_specifications: usize,
    pub value_properties: usize,
    pub value_requirements: usize,
    pub value_specifications: usize,
    pub resolved_value_requirements: usize,
}

pub fn stats() -> InterningStats {
    InterningStats {
        unique_ids: UniqueId::pool().live_count(),
        target_specifications: TargetSpecification::pool().live_count(),
        value_properties: ValueProperties::pool().live_count(),
        value_requirements: ValueRequirement::pool().live_count(),
        value_specifications: ValueSpecification::pool().live_count(),
        resolved_value_requirements: ResolvedValueRequirement::pool().live_count(),
    }
}

/// Sweep dead slots from every global pool
pub fn purge_all() -> usize {
    UniqueId::pool().purge()
        + TargetSpecification::pool().purge()
        + ValueProperties::pool().purge()
        + ValueRequirement::pool().purge()
        + ValueSpecification::pool().purge()
        + ResolvedValueRequirement::pool().purge()
}

/// Apply the configured purge interval to every global pool
pub fn configure(config: &ResolverCacheConfig) {
    let interval = config.intern_pool_purge_interval;
    UniqueId::pool().set_purge_interval(interval);
    TargetSpecification::pool().set_purge_interval(interval);
    ValueProperties::pool().set_purge_interval(interval);
    ValueRequirement::pool().set_purge_interval(interval);
    ValueSpecification::pool().set_purge_interval(interval);
    ResolvedValueRequirement::pool().set_purge_interval(interval);
    info!(interval, "Configured interning pool purge interval");
}
