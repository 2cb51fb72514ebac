//! Configuration Loader
//!
//! Layers a configuration file under `TARGET_RESOLVER__*` environment
//! variables. The file format (TOML, YAML, JSON) follows the extension.

use super::resolver_cache_config::ResolverCacheConfig;
use crate::error::Result;
use config::{Config, Environment, File};
use std::path::Path;
use tracing::debug;

/// Loader for [`ResolverCacheConfig`] files
pub struct ResolverConfigLoader;

impl ResolverConfigLoader {
    /// Load from `path`, letting environment variables override file values
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<ResolverCacheConfig> {
        let path = path.as_ref();
        debug!("Loading resolver cache configuration from: {}", path.display());

        let settings = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(
                Environment::with_prefix("TARGET_RESOLVER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ResolverCacheConfig = settings.try_deserialize()?;
        config.validate()?;
        config.log_configuration();
        Ok(config)
    }

    /// Load from `path` when present, otherwise fall back to the environment presets
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<ResolverCacheConfig> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(
                "No resolver cache configuration at {}, using environment presets",
                path.display()
            );
            let config = ResolverCacheConfig::from_environment();
            config.validate()?;
            Ok(config)
        }
    }
}

impl ResolverCacheConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        ResolverConfigLoader::load_from_file(path)
    }
}
