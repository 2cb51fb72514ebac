//! Sources that answer through a caching resolver
//!
//! Handed out by [`CachingTargetResolver::security_source`] and
//! [`CachingTargetResolver::position_source`] so that code holding a source
//! shares the resolver's cached instances instead of fetching its own copies.
//! Whole portfolios are not target values and go straight to the underlying
//! source.
//!
//! [`LinkedSecuritySource`] is the variant handed to lazily resolving values
//! cached by the resolver. It holds the resolver weakly so that cached values
//! never keep their own cache alive.

use super::traits::{PositionSource, SecuritySource};
use crate::models::{
    Portfolio, PortfolioNode, Position, Security, TargetSpecification, TargetValue, Trade,
    UniqueId, VersionCorrection,
};
use crate::resolver::{CachingTargetResolver, ComputationTargetResolver, WeakCachingTargetResolver};
use std::sync::Arc;
use tracing::warn;

/// Resolve `specification` through `resolver` and project the value
///
/// A resolution error bypasses the cache and is answered by `fallback`.
fn resolve_through<T>(
    resolver: &CachingTargetResolver,
    specification: TargetSpecification,
    version_correction: VersionCorrection,
    project: impl FnOnce(&TargetValue) -> Option<Arc<T>>,
    fallback: impl FnOnce() -> Option<Arc<T>>,
) -> Option<Arc<T>> {
    let specification = Arc::new(specification);
    match resolver.resolve(&specification, version_correction) {
        Ok(target) => target.and_then(|target| target.value().and_then(|value| project(value))),
        Err(err) => {
            warn!(
                specification = %specification,
                error = %err,
                "Cached source lookup failed, reading underlying source directly"
            );
            fallback()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachingSecuritySource {
    resolver: CachingTargetResolver,
    underlying: Arc<dyn SecuritySource>,
}

impl CachingSecuritySource {
    pub fn new(resolver: CachingTargetResolver, underlying: Arc<dyn SecuritySource>) -> Self {
        Self {
            resolver,
            underlying,
        }
    }
}

impl SecuritySource for CachingSecuritySource {
    fn get(&self, unique_id: &UniqueId, version_correction: VersionCorrection) -> Option<Arc<Security>> {
        resolve_through(
            &self.resolver,
            TargetSpecification::of_security(unique_id.clone()),
            version_correction,
            |value| value.as_security().cloned(),
            || self.underlying.get(unique_id, version_correction),
        )
    }

    fn source_name(&self) -> &'static str {
        "caching"
    }
}

/// Security lookups for lazily resolving values, through the resolver while it lives
#[derive(Debug, Clone)]
pub struct LinkedSecuritySource {
    resolver: WeakCachingTargetResolver,
    fallback: Arc<dyn SecuritySource>,
}

impl LinkedSecuritySource {
    pub fn new(resolver: WeakCachingTargetResolver, fallback: Arc<dyn SecuritySource>) -> Self {
        Self { resolver, fallback }
    }
}

impl SecuritySource for LinkedSecuritySource {
    fn get(&self, unique_id: &UniqueId, version_correction: VersionCorrection) -> Option<Arc<Security>> {
        match self.resolver.upgrade() {
            Some(resolver) => resolve_through(
                &resolver,
                TargetSpecification::of_security(unique_id.clone()),
                version_correction,
                |value| value.as_security().cloned(),
                || self.fallback.get(unique_id, version_correction),
            ),
            None => self.fallback.get(unique_id, version_correction),
        }
    }

    fn source_name(&self) -> &'static str {
        "linked"
    }
}

#[derive(Debug, Clone)]
pub struct CachingPositionSource {
    resolver: CachingTargetResolver,
    underlying: Arc<dyn PositionSource>,
}

impl CachingPositionSource {
    pub fn new(resolver: CachingTargetResolver, underlying: Arc<dyn PositionSource>) -> Self {
        Self {
            resolver,
            underlying,
        }
    }
}

impl PositionSource for CachingPositionSource {
    fn get_position(
        &self,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Option<Arc<Position>> {
        resolve_through(
            &self.resolver,
            TargetSpecification::of_position(unique_id.clone()),
            version_correction,
            |value| value.as_position().map(|lazy| lazy.position().clone()),
            || self.underlying.get_position(unique_id, version_correction),
        )
    }

    fn get_trade(
        &self,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Option<Arc<Trade>> {
        resolve_through(
            &self.resolver,
            TargetSpecification::of_trade(unique_id.clone()),
            version_correction,
            |value| value.as_trade().map(|lazy| lazy.trade().clone()),
            || self.underlying.get_trade(unique_id, version_correction),
        )
    }

    fn get_portfolio_node(
        &self,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Option<Arc<PortfolioNode>> {
        // node resolution falls back to portfolio roots; a plain node lookup must not
        resolve_through(
            &self.resolver,
            TargetSpecification::of_portfolio_node(unique_id.clone()),
            version_correction,
            |value| {
                value
                    .as_portfolio_node()
                    .map(|lazy| lazy.node().clone())
                    .filter(|node| &node.unique_id == unique_id)
            },
            || self.underlying.get_portfolio_node(unique_id, version_correction),
        )
    }

    fn get_portfolio(
        &self,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Option<Arc<Portfolio>> {
        self.underlying.get_portfolio(unique_id, version_correction)
    }

    fn source_name(&self) -> &'static str {
        "caching"
    }
}
