//! # Resolver Configuration
//!
//! Tunables for the caching resolver and interning pools.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use target_resolver::config::ResolverCacheConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Presets picked by TARGET_RESOLVER_ENV / RUST_ENV, then env overrides
//! let config = ResolverCacheConfig::from_environment();
//! config.validate()?;
//!
//! // Or layered from a file
//! let config = ResolverCacheConfig::load_from_file("config/resolver.toml")?;
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod resolver_cache_config;

pub use loader::ResolverConfigLoader;
pub use resolver_cache_config::ResolverCacheConfig;
