//! Resolver Cache Configuration Management
//!
//! Environment-aware presets for the caching resolver and the interning
//! pools, with environment variable overrides. Test presets purge expired
//! weak entries aggressively so tests observe eviction quickly.

use crate::error::{Result, TargetResolutionError};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

const ENV_PREFIX: &str = "TARGET_RESOLVER";

/// Configuration for the caching resolver tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverCacheConfig {
    /// Route resolved values to the backing store
    pub backing_store_enabled: bool,
    /// Upper bound on the in-memory backing store
    pub backing_store_max_entries: usize,
    /// Inserts into a front cache between sweeps of expired weak entries
    pub front_cache_purge_interval: usize,
    /// Inserts into an interning pool between sweeps of expired slots
    pub intern_pool_purge_interval: usize,
}

impl Default for ResolverCacheConfig {
    /// Default configuration suitable for production
    fn default() -> Self {
        Self {
            backing_store_enabled: true,
            backing_store_max_entries: 100_000,
            front_cache_purge_interval: 10_000,
            intern_pool_purge_interval: 4_096,
        }
    }
}

impl ResolverCacheConfig {
    /// Create test-optimized configuration with rapid eviction
    pub fn for_test() -> Self {
        Self {
            backing_store_enabled: true,
            backing_store_max_entries: 1_000,
            front_cache_purge_interval: 16,
            intern_pool_purge_interval: 16,
        }
    }

    /// Create development-optimized configuration
    pub fn for_development() -> Self {
        Self {
            backing_store_enabled: true,
            backing_store_max_entries: 10_000,
            front_cache_purge_interval: 1_000,
            intern_pool_purge_interval: 1_024,
        }
    }

    /// Detect the running environment from common environment variables
    pub fn detect_environment() -> String {
        env::var("TARGET_RESOLVER_ENV")
            .or_else(|_| env::var("RUST_ENV"))
            .unwrap_or_else(|_| "production".to_string())
    }

    /// Load configuration from environment or use defaults
    pub fn from_environment() -> Self {
        let environment = Self::detect_environment();

        let config = match environment.as_str() {
            "test" => {
                info!("Loading test resolver cache configuration (rapid eviction)");
                Self::for_test()
            }
            "development" => {
                info!("Loading development resolver cache configuration");
                Self::for_development()
            }
            _ => {
                info!("Loading production resolver cache configuration");
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    /// Apply environment variable overrides to configuration
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, keyed by full variable name
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}_{suffix}"));

        if let Some(enabled) = var("BACKING_STORE_ENABLED") {
            self.backing_store_enabled = enabled.parse().unwrap_or(self.backing_store_enabled);
            info!("Backing store enabled override: {}", self.backing_store_enabled);
        }

        if let Some(max) = var("BACKING_STORE_MAX_ENTRIES") {
            if let Ok(entries) = max.parse::<usize>() {
                self.backing_store_max_entries = entries;
                info!("Backing store max entries override: {}", entries);
            }
        }

        if let Some(interval) = var("FRONT_CACHE_PURGE_INTERVAL") {
            if let Ok(inserts) = interval.parse::<usize>() {
                self.front_cache_purge_interval = inserts;
                info!("Front cache purge interval override: {}", inserts);
            }
        }

        if let Some(interval) = var("INTERN_POOL_PURGE_INTERVAL") {
            if let Ok(inserts) = interval.parse::<usize>() {
                self.intern_pool_purge_interval = inserts;
                info!("Interning pool purge interval override: {}", inserts);
            }
        }

        self
    }

    /// Log current configuration for debugging
    pub fn log_configuration(&self) {
        info!("Resolver Cache Configuration:");
        info!(
            "  Backing Store: enabled={}, {} max entries",
            self.backing_store_enabled, self.backing_store_max_entries
        );
        info!(
            "  Front Cache Purge Interval: {} inserts",
            self.front_cache_purge_interval
        );
        info!(
            "  Interning Pool Purge Interval: {} inserts",
            self.intern_pool_purge_interval
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.front_cache_purge_interval == 0 {
            return Err(TargetResolutionError::Configuration {
                message: "Front cache purge interval must be greater than 0".to_string(),
            });
        }

        if self.intern_pool_purge_interval == 0 {
            return Err(TargetResolutionError::Configuration {
                message: "Interning pool purge interval must be greater than 0".to_string(),
            });
        }

        if self.backing_store_enabled && self.backing_store_max_entries == 0 {
            warn!("Backing store max entries is 0 - backing cache effectively disabled");
        }

        Ok(())
    }
}
