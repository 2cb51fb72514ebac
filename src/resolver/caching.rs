//! # Caching Target Resolver
//!
//! Decorates another resolver with three cache tiers:
//!
//! | Tier | Key | Holds |
//! |---|---|---|
//! | target cache | `(specification, version-correction)` | weak `ComputationTarget` |
//! | object cache | `(unique id, version-correction)` | weak `TargetValue` |
//! | backing store | `(unique id, version-correction)` | strong `TargetValue`, long-lived |
//!
//! ## Resolution Flow
//!
//! ```text
//! resolve(spec, vc)
//!   ├── NULL spec            -> shared NULL target, no cache interaction
//!   ├── fix "latest" in vc
//!   ├── target cache hit     -> return
//!   ├── object cache hit     -> wrap, publish to target cache
//!   ├── backing store hit    -> promote to object cache, wrap, publish
//!   └── underlying resolver
//!         ├── not found      -> Ok(None), nothing cached
//!         └── found          -> object cache, deferred backing write, target cache
//! ```
//!
//! A cached value whose kind cannot serve the requested type counts as a
//! miss, and the freshly resolved value then replaces it in the object cache.
//!
//! Positions, trades and portfolio nodes coming from the underlying resolver
//! are re-linked so that their securities are looked up through this
//! resolver on first access. The link holds the resolver weakly; once the
//! resolver is gone the lookups go to the underlying security source.
//!
//! Every front cache insertion is put-if-absent, so concurrent callers racing
//! on the same coordinate all receive the instance that won.

use super::{AtVersionCorrectionResolver, ComputationTargetResolver, DelegatingTargetResolver};
use crate::cache::{
    BackingStore, DeferredBackingWriter, InMemoryBackingStore, ObjectCacheKey, SubmitOutcome,
    TargetCacheKey, WeakValueCache,
};
use crate::config::ResolverCacheConfig;
use crate::error::{Result, TargetResolutionError};
use crate::interning::normalize;
use crate::models::{
    ComputationTarget, TargetSpecification, TargetType, TargetValue, UniqueIdentifiable,
    VersionCorrection,
};
use crate::sources::{
    CachingPositionSource, CachingSecuritySource, LinkedSecuritySource, PositionSource,
    SecuritySource,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace};

#[derive(Clone)]
pub struct CachingTargetResolver {
    state: Arc<CachingState>,
}

/// Non-owning handle on a [`CachingTargetResolver`]
#[derive(Clone)]
pub struct WeakCachingTargetResolver {
    state: Weak<CachingState>,
}

impl WeakCachingTargetResolver {
    pub fn upgrade(&self) -> Option<CachingTargetResolver> {
        self.state
            .upgrade()
            .map(|state| CachingTargetResolver { state })
    }
}

impl fmt::Debug for WeakCachingTargetResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCachingTargetResolver")
            .field("alive", &(self.state.strong_count() > 0))
            .finish()
    }
}

struct CachingState {
    underlying: DelegatingTargetResolver,
    object_cache: WeakValueCache<ObjectCacheKey, TargetValue>,
    target_cache: WeakValueCache<TargetCacheKey, ComputationTarget>,
    backing_writer: Option<DeferredBackingWriter>,
    counters: CacheCounters,
}

#[derive(Debug, Default)]
struct CacheCounters {
    target_hits: AtomicU64,
    object_hits: AtomicU64,
    backing_hits: AtomicU64,
    incompatible_hits: AtomicU64,
    underlying_resolutions: AtomicU64,
    not_found: AtomicU64,
}

/// Snapshot of cache sizes and counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverCacheStats {
    pub target_cache_entries: usize,
    pub object_cache_entries: usize,
    pub backing_store_entries: usize,
    pub pending_backing_writes: usize,
    pub backing_writes: u64,
    pub suppressed_backing_writes: u64,
    pub target_cache_hits: u64,
    pub object_cache_hits: u64,
    pub backing_store_hits: u64,
    /// Cached values skipped because they could not serve the requested type
    pub incompatible_hits: u64,
    pub underlying_resolutions: u64,
    pub not_found: u64,
}

impl CachingTargetResolver {
    /// Cache in front of `underlying` with default settings and the given backing store
    pub fn new(
        underlying: Arc<dyn ComputationTargetResolver>,
        backing_store: Arc<dyn BackingStore>,
    ) -> Self {
        Self::build(underlying, Some(backing_store), &ResolverCacheConfig::default())
    }

    /// Cache in front of `underlying` with the given backing store and settings
    ///
    /// The store is left unused when `config.backing_store_enabled` is false.
    pub fn with_config(
        underlying: Arc<dyn ComputationTargetResolver>,
        backing_store: Arc<dyn BackingStore>,
        config: &ResolverCacheConfig,
    ) -> Result<Self> {
        config.validate()?;
        let backing_store = config.backing_store_enabled.then_some(backing_store);
        Ok(Self::build(underlying, backing_store, config))
    }

    /// Cache in front of `underlying` backed by a bounded in-memory store sized from `config`
    pub fn from_config(
        underlying: Arc<dyn ComputationTargetResolver>,
        config: &ResolverCacheConfig,
    ) -> Result<Self> {
        config.validate()?;
        let backing_store = config.backing_store_enabled.then(|| {
            Arc::new(InMemoryBackingStore::new(config.backing_store_max_entries))
                as Arc<dyn BackingStore>
        });
        Ok(Self::build(underlying, backing_store, config))
    }

    /// Front caches only
    pub fn without_backing_store(underlying: Arc<dyn ComputationTargetResolver>) -> Self {
        Self::build(underlying, None, &ResolverCacheConfig::default())
    }

    fn build(
        underlying: Arc<dyn ComputationTargetResolver>,
        backing_store: Option<Arc<dyn BackingStore>>,
        config: &ResolverCacheConfig,
    ) -> Self {
        info!(
            backing_store = backing_store.as_ref().map(|store| store.store_name()),
            front_cache_purge_interval = config.front_cache_purge_interval,
            "Creating caching target resolver"
        );
        let interval = config.front_cache_purge_interval;
        Self {
            state: Arc::new(CachingState {
                underlying: DelegatingTargetResolver::new(underlying),
                object_cache: WeakValueCache::new("object", interval),
                target_cache: WeakValueCache::new("target", interval),
                backing_writer: backing_store.map(DeferredBackingWriter::new),
                counters: CacheCounters::default(),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakCachingTargetResolver {
        WeakCachingTargetResolver {
            state: Arc::downgrade(&self.state),
        }
    }

    pub fn underlying(&self) -> &Arc<dyn ComputationTargetResolver> {
        self.state.underlying.underlying()
    }

    pub fn backing_store(&self) -> Option<&Arc<dyn BackingStore>> {
        self.state.backing_writer.as_ref().map(DeferredBackingWriter::store)
    }

    /// Seed the caches with targets resolved elsewhere
    ///
    /// Returns the canonical instance for each input, which is the input
    /// itself unless an equal target was already cached.
    pub fn cache_targets(
        &self,
        targets: impl IntoIterator<Item = Arc<ComputationTarget>>,
        version_correction: VersionCorrection,
    ) -> Result<Vec<Arc<ComputationTarget>>> {
        let version_correction = version_correction.fixed_now();
        targets
            .into_iter()
            .map(|target| {
                if target.is_null() {
                    return Ok(target);
                }
                let key = TargetCacheKey::new(
                    normalize(target.specification().clone()),
                    version_correction,
                );
                self.publish(key, target, version_correction)
            })
            .collect()
    }

    pub fn cache_stats(&self) -> ResolverCacheStats {
        let state = &self.state;
        let counters = &state.counters;
        let writer = state.backing_writer.as_ref();
        ResolverCacheStats {
            target_cache_entries: state.target_cache.live_count(),
            object_cache_entries: state.object_cache.live_count(),
            backing_store_entries: writer.map_or(0, |w| w.store().len()),
            pending_backing_writes: writer.map_or(0, DeferredBackingWriter::pending),
            backing_writes: writer.map_or(0, DeferredBackingWriter::written_count),
            suppressed_backing_writes: writer.map_or(0, DeferredBackingWriter::suppressed_count),
            target_cache_hits: counters.target_hits.load(Ordering::Relaxed),
            object_cache_hits: counters.object_hits.load(Ordering::Relaxed),
            backing_store_hits: counters.backing_hits.load(Ordering::Relaxed),
            incompatible_hits: counters.incompatible_hits.load(Ordering::Relaxed),
            underlying_resolutions: counters.underlying_resolutions.load(Ordering::Relaxed),
            not_found: counters.not_found.load(Ordering::Relaxed),
        }
    }

    /// Drop front cache entries whose values are no longer referenced
    pub fn purge_expired(&self) -> usize {
        self.state.target_cache.purge_expired() + self.state.object_cache.purge_expired()
    }

    /// Drain pending backing writes on this thread; returns how many remain queued
    ///
    /// Entries stay queued only while another thread is mid-drain.
    pub fn flush_backing_writes(&self) -> usize {
        self.state
            .backing_writer
            .as_ref()
            .map_or(0, DeferredBackingWriter::flush)
    }

    fn lookup_object(
        &self,
        key: &ObjectCacheKey,
        target_type: &TargetType,
    ) -> Option<Arc<TargetValue>> {
        let state = &self.state;
        if let Some(value) = state.object_cache.get(key) {
            if target_type.is_compatible_value(&value) {
                state.counters.object_hits.fetch_add(1, Ordering::Relaxed);
                return Some(value);
            }
            self.note_incompatible(key, &value, target_type);
        }

        let writer = state.backing_writer.as_ref()?;
        let value = writer.store().get(key)?;
        if !target_type.is_compatible_value(&value) {
            self.note_incompatible(key, &value, target_type);
            return None;
        }
        state.counters.backing_hits.fetch_add(1, Ordering::Relaxed);
        trace!(unique_id = %key.unique_id, "Backing store hit");
        Some(state.object_cache.put_if_absent_where(key.clone(), value, |cached| {
            target_type.is_compatible_value(cached)
        }))
    }

    fn note_incompatible(&self, key: &ObjectCacheKey, value: &TargetValue, target_type: &TargetType) {
        self.state
            .counters
            .incompatible_hits
            .fetch_add(1, Ordering::Relaxed);
        debug!(
            unique_id = %key.unique_id,
            cached_kind = %value.kind(),
            requested_type = %target_type,
            "Cached value cannot serve requested type, treating as miss"
        );
    }

    /// Point the linked securities of a freshly resolved value at this resolver
    fn link_securities(&self, target: Arc<ComputationTarget>) -> Result<Arc<ComputationTarget>> {
        let Some(value) = target.value().filter(|value| value.has_linked_securities()) else {
            return Ok(target);
        };
        let Some(fallback) = self.state.underlying.security_source() else {
            return Ok(target);
        };
        let linked: Arc<dyn SecuritySource> =
            Arc::new(LinkedSecuritySource::new(self.downgrade(), fallback));
        match value.with_security_source(&linked) {
            Some(value) => Ok(Arc::new(ComputationTarget::new(
                target.specification().clone(),
                Arc::new(value),
            )?)),
            None => Ok(target),
        }
    }

    /// Publish a freshly resolved target to every tier and return the canonical target
    fn publish(
        &self,
        key: TargetCacheKey,
        target: Arc<ComputationTarget>,
        version_correction: VersionCorrection,
    ) -> Result<Arc<ComputationTarget>> {
        let state = &self.state;
        let Some(value) = target.value().cloned() else {
            return Ok(target);
        };
        let target_type = target.specification().target_type();
        let object_key = ObjectCacheKey::new(value.unique_id().clone(), version_correction);
        let canonical = state
            .object_cache
            .put_if_absent_where(object_key.clone(), value.clone(), |cached| {
                target_type.is_compatible_value(cached)
            });

        let target = if Arc::ptr_eq(&canonical, &value) {
            self.submit_backing_write(object_key, value);
            target
        } else {
            Arc::new(ComputationTarget::for_value(target.specification(), canonical)?)
        };
        Ok(state.target_cache.put_if_absent(key, target))
    }

    fn submit_backing_write(&self, key: ObjectCacheKey, value: Arc<TargetValue>) {
        let Some(writer) = &self.state.backing_writer else {
            return;
        };
        let unique_id = key.unique_id.clone();
        match writer.submit(key, value) {
            SubmitOutcome::Written => trace!(unique_id = %unique_id, "Wrote backing store entry"),
            SubmitOutcome::Queued => trace!(unique_id = %unique_id, "Queued backing store write"),
            SubmitOutcome::Suppressed => {
                debug!(unique_id = %unique_id, "Skipped backing store write from within a backing store write")
            }
        }
    }
}

impl ComputationTargetResolver for CachingTargetResolver {
    fn resolve(
        &self,
        specification: &Arc<TargetSpecification>,
        version_correction: VersionCorrection,
    ) -> Result<Option<Arc<ComputationTarget>>> {
        if specification.is_null() {
            return Ok(Some(ComputationTarget::null()));
        }
        let state = &self.state;
        let version_correction = version_correction.fixed_now();

        let lookup_key = TargetCacheKey::new(specification.clone(), version_correction);
        if let Some(target) = state.target_cache.get(&lookup_key) {
            state.counters.target_hits.fetch_add(1, Ordering::Relaxed);
            trace!(specification = %specification, "Target cache hit");
            return Ok(Some(target));
        }

        let unique_id = specification.unique_id().ok_or_else(|| {
            TargetResolutionError::InvalidSpecification {
                reason: format!("{specification} has no unique id"),
            }
        })?;
        let specification = normalize(specification.clone());
        let key = TargetCacheKey::new(specification.clone(), version_correction);
        let object_key = ObjectCacheKey::new(unique_id.clone(), version_correction);

        if let Some(value) = self.lookup_object(&object_key, specification.target_type()) {
            let target = Arc::new(ComputationTarget::for_value(&specification, value)?);
            return Ok(Some(state.target_cache.put_if_absent(key, target)));
        }

        state
            .counters
            .underlying_resolutions
            .fetch_add(1, Ordering::Relaxed);
        match state.underlying.resolve(&specification, version_correction)? {
            Some(target) => {
                let target = self.link_securities(target)?;
                self.publish(key, target, version_correction).map(Some)
            }
            None => {
                state.counters.not_found.fetch_add(1, Ordering::Relaxed);
                debug!(
                    specification = %specification,
                    version_correction = %version_correction,
                    "Target not found, not caching"
                );
                Ok(None)
            }
        }
    }

    fn security_source(&self) -> Option<Arc<dyn SecuritySource>> {
        self.state.underlying.security_source().map(|source| {
            Arc::new(CachingSecuritySource::new(self.clone(), source)) as Arc<dyn SecuritySource>
        })
    }

    fn position_source(&self) -> Option<Arc<dyn PositionSource>> {
        self.state.underlying.position_source().map(|source| {
            Arc::new(CachingPositionSource::new(self.clone(), source)) as Arc<dyn PositionSource>
        })
    }

    fn at_version_correction(&self, version_correction: VersionCorrection) -> AtVersionCorrectionResolver {
        AtVersionCorrectionResolver::new(Arc::new(self.clone()), version_correction)
    }
}

impl fmt::Debug for CachingTargetResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingTargetResolver")
            .field("underlying", &self.state.underlying)
            .field("target_cache_entries", &self.state.target_cache.len())
            .field("object_cache_entries", &self.state.object_cache.len())
            .field("backing_writer", &self.state.backing_writer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoOpBackingStore;
    use crate::models::{Security, UniqueId};
    use crate::resolver::{DefaultTargetResolver, MapTargetResolver};
    use crate::sources::InMemorySecuritySource;
    use chrono::{TimeZone, Utc};

    fn pinned() -> VersionCorrection {
        VersionCorrection::fixed_at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }

    fn security_resolver() -> (Arc<InMemorySecuritySource>, UniqueId, CachingTargetResolver) {
        let securities = Arc::new(InMemorySecuritySource::new());
        let id = securities.add_security(|id| Security::new(id, "ACME", "EQUITY"));
        let resolver = CachingTargetResolver::new(
            Arc::new(DefaultTargetResolver::default().with_security_source(securities.clone())),
            Arc::new(InMemoryBackingStore::new(100)),
        );
        (securities, id, resolver)
    }

    #[test]
    fn test_repeated_resolution_returns_same_instance() {
        let (securities, id, resolver) = security_resolver();
        let spec = Arc::new(TargetSpecification::of_security(id));

        let first = resolver.resolve(&spec, pinned()).unwrap().unwrap();
        let second = resolver.resolve(&spec, pinned()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(securities.lookup_count(), 1);

        let stats = resolver.cache_stats();
        assert_eq!(stats.target_cache_hits, 1);
        assert_eq!(stats.underlying_resolutions, 1);
        assert_eq!(stats.backing_writes, 1);
    }

    #[test]
    fn test_object_cache_serves_new_specification_for_same_id() {
        let (securities, id, resolver) = security_resolver();
        let security = resolver
            .resolve(&Arc::new(TargetSpecification::of_security(id.clone())), pinned())
            .unwrap()
            .unwrap();
        let primitive = resolver
            .resolve(&Arc::new(TargetSpecification::of_primitive(id)), pinned())
            .unwrap()
            .unwrap();

        assert!(Arc::ptr_eq(security.value().unwrap(), primitive.value().unwrap()));
        assert_eq!(securities.lookup_count(), 1);
        assert_eq!(resolver.cache_stats().object_cache_hits, 1);
    }

    #[test]
    fn test_incompatible_cached_value_is_a_miss() {
        let (securities, id, resolver) = security_resolver();
        let primitive = resolver
            .resolve(&Arc::new(TargetSpecification::of_primitive(id.clone())), pinned())
            .unwrap()
            .unwrap();
        let security = resolver
            .resolve(&Arc::new(TargetSpecification::of_security(id)), pinned())
            .unwrap()
            .unwrap();

        assert!(primitive.value().unwrap().as_security().is_none());
        assert!(security.value().unwrap().as_security().is_some());
        assert_eq!(securities.lookup_count(), 1);
        // skipped once in the object cache and once in the backing store
        assert_eq!(resolver.cache_stats().incompatible_hits, 2);
    }

    #[test]
    fn test_backing_store_hit_is_promoted() {
        let id = UniqueId::of("Sec", "seeded");
        let store = Arc::new(InMemoryBackingStore::new(10));
        store.put(
            ObjectCacheKey::new(id.clone(), pinned()),
            Arc::new(TargetValue::Security(Arc::new(Security::new(id.clone(), "Seeded", "EQUITY")))),
        );
        // no security source: a fall-through to the underlying resolver would fail
        let resolver = CachingTargetResolver::new(Arc::new(DefaultTargetResolver::default()), store);

        let target = resolver
            .resolve(&Arc::new(TargetSpecification::of_security(id)), pinned())
            .unwrap()
            .unwrap();
        assert_eq!(target.value().unwrap().as_security().unwrap().name, "Seeded");

        let stats = resolver.cache_stats();
        assert_eq!(stats.backing_store_hits, 1);
        assert_eq!(stats.underlying_resolutions, 0);
        assert_eq!(stats.object_cache_entries, 1);
    }

    #[test]
    fn test_values_held_by_backing_store_stay_in_object_cache() {
        let (securities, id, resolver) = security_resolver();
        let spec = Arc::new(TargetSpecification::of_security(id));

        drop(resolver.resolve(&spec, pinned()).unwrap());
        assert_eq!(resolver.cache_stats().target_cache_entries, 0);

        let again = resolver.resolve(&spec, pinned()).unwrap().unwrap();
        assert!(again.value().unwrap().as_security().is_some());
        assert_eq!(securities.lookup_count(), 1);
        assert_eq!(resolver.cache_stats().object_cache_hits, 1);
    }

    #[test]
    fn test_not_found_is_never_cached() {
        let (securities, _, resolver) = security_resolver();
        let spec = Arc::new(TargetSpecification::of_security(UniqueId::of("MemSec", "none")));

        assert!(resolver.resolve(&spec, pinned()).unwrap().is_none());
        assert!(resolver.resolve(&spec, pinned()).unwrap().is_none());
        assert_eq!(securities.lookup_count(), 2);
        assert_eq!(resolver.cache_stats().not_found, 2);
    }

    #[test]
    fn test_null_specification_bypasses_caches() {
        let resolver = CachingTargetResolver::without_backing_store(Arc::new(MapTargetResolver::new()));
        let target = resolver
            .resolve(&TargetSpecification::null(), VersionCorrection::LATEST)
            .unwrap()
            .unwrap();
        assert!(target.is_null());
        assert_eq!(resolver.cache_stats(), ResolverCacheStats::default());
    }

    #[test]
    fn test_cache_targets_returns_canonical_instances() {
        let map = MapTargetResolver::new();
        let resolver = CachingTargetResolver::new(Arc::new(map.clone()), Arc::new(NoOpBackingStore::new()));
        let seeded = map.add_primitive(UniqueId::of("Prim", "seed")).unwrap();

        let canonical = resolver.cache_targets([seeded.clone()], pinned()).unwrap();
        assert!(Arc::ptr_eq(&canonical[0], &seeded));

        let resolved = resolver
            .resolve(seeded.specification(), pinned())
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&resolved, &seeded));
        assert_eq!(resolver.cache_stats().underlying_resolutions, 0);
    }

    #[test]
    fn test_disabled_backing_store_is_not_used() {
        let mut config = ResolverCacheConfig::for_test();
        config.backing_store_enabled = false;
        let resolver = CachingTargetResolver::from_config(Arc::new(MapTargetResolver::new()), &config).unwrap();
        assert!(resolver.backing_store().is_none());
        assert_eq!(resolver.flush_backing_writes(), 0);
    }

    #[test]
    fn test_with_config_rejects_invalid_settings() {
        let mut config = ResolverCacheConfig::for_test();
        config.front_cache_purge_interval = 0;
        let result = CachingTargetResolver::with_config(
            Arc::new(MapTargetResolver::new()),
            Arc::new(NoOpBackingStore::new()),
            &config,
        );
        assert!(matches!(result, Err(TargetResolutionError::Configuration { .. })));
    }

    #[test]
    fn test_weak_handle_does_not_keep_resolver_alive() {
        let (_, _, resolver) = security_resolver();
        let weak = resolver.downgrade();
        assert!(weak.upgrade().is_some());
        drop(resolver);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_purge_expired_drops_dead_entries() {
        let (_, id, resolver) = security_resolver();
        drop(resolver.resolve(&Arc::new(TargetSpecification::of_security(id)), pinned()));
        assert_eq!(resolver.purge_expired(), 1);
    }
}
