#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Target Resolver
//!
//! Resolution and caching of computation targets for financial dependency graphs.
//!
//! ## Overview
//!
//! A dependency graph with millions of edges refers to the same few thousand
//! securities, positions, trades and portfolio nodes over and over. Edges carry
//! lightweight [`TargetSpecification`]s; this crate turns them into materialized
//! [`ComputationTarget`]s and remembers the mapping so that every edge shares
//! one instance per entity instead of fetching and allocating its own.
//!
//! ## Architecture
//!
//! ```text
//! caller ── resolve(spec, vc) ──> CachingTargetResolver
//!                                   ├── target cache   (weak)
//!                                   ├── object cache   (weak)
//!                                   ├── backing store  (strong, single deferred writer)
//!                                   └── DefaultTargetResolver ──> SecuritySource / PositionSource
//! ```
//!
//! Independently of resolution, [`interning::normalize`] collapses equal
//! specifications and value requirements into one shared instance.
//!
//! ## Module Organization
//!
//! - [`models`] - specifications, targets, type tags and entities
//! - [`resolver`] - the resolver trait and its implementations
//! - [`cache`] - weak front caches, backing stores and the deferred writer
//! - [`interning`] - process-wide instance pools
//! - [`sources`] - entity source traits, in-memory sources and lazy decorators
//! - [`config`] - cache configuration presets and file loading
//! - [`error`] - structured error handling
//! - [`logging`] - tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use target_resolver::cache::InMemoryBackingStore;
//! use target_resolver::models::{Security, TargetSpecification, VersionCorrection};
//! use target_resolver::resolver::{CachingTargetResolver, ComputationTargetResolver, DefaultTargetResolver};
//! use target_resolver::sources::InMemorySecuritySource;
//!
//! # fn main() -> target_resolver::Result<()> {
//! let securities = Arc::new(InMemorySecuritySource::new());
//! let id = securities.add_security(|id| Security::new(id, "ACME Corp", "EQUITY"));
//!
//! let resolver = CachingTargetResolver::new(
//!     Arc::new(DefaultTargetResolver::default().with_security_source(securities)),
//!     Arc::new(InMemoryBackingStore::new(10_000)),
//! );
//! let snapshot = resolver.at_version_correction(VersionCorrection::LATEST);
//!
//! let spec = Arc::new(TargetSpecification::of_security(id));
//! let first = snapshot.resolve(&spec)?.expect("security exists");
//! let second = snapshot.resolve(&spec)?.expect("security exists");
//! assert!(Arc::ptr_eq(&first, &second));
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod interning;
pub mod logging;
pub mod models;
pub mod resolver;
pub mod sources;
pub mod utils;

pub use cache::{BackingStore, InMemoryBackingStore, NoOpBackingStore};
pub use config::{ResolverCacheConfig, ResolverConfigLoader};
pub use error::{Result, TargetResolutionError};
pub use interning::normalize;
pub use logging::init_structured_logging;
pub use models::{
    ComputationTarget, TargetSpecification, TargetType, TargetValue, UniqueId, VersionCorrection,
};
pub use resolver::{
    AtVersionCorrectionResolver, CachingTargetResolver, ComputationTargetResolver,
    DefaultTargetResolver, DelegatingTargetResolver, MapTargetResolver, ResolverCacheStats,
};
pub use sources::{InMemoryPositionSource, InMemorySecuritySource, PositionSource, SecuritySource};
pub use utils::{estimate_size, estimate_target_size};
