//! Refract cache resolution
//!
//! The cache-resolution layer of an image-transformation pipeline: given a
//! source asset path and a named filter, decide whether a transformed
//! artifact is already cached in a backing store, hand back a
//! browser-accessible locator for it, and invalidate cached artifacts in
//! bulk across multiple backends.
//!
//! - **[`CacheManager`]** dispatches every operation to the resolver backend
//!   bound for a filter, synthesizes signed on-demand generation URLs on
//!   cache misses, and batches removals by backend instance.
//! - **[`CacheResolver`]** is the backend capability; [`WebPathResolver`]
//!   (filesystem web root) and [`MemoryResolver`] (bounded in-memory) ship
//!   with the crate.
//! - **[`DeliveryService`]** drives on-demand generation when a signed URL
//!   is dereferenced.
//!
//! ## Configuration
//!
//! Settings load from `refract.toml` with environment overrides:
//!
//! ```toml
//! [cache]
//! default_resolver = "fs"
//! sign_secret = "s3cret"
//!
//! [filters.thumbnail]
//! format = "png"
//!
//! [filters.thumbnail.filters.thumb]
//! size = [120, 90]
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::delivery::{DeliveryError, DeliveryService, SourceLoader, TransformEngine};
pub use application::error::CacheError;
pub use application::manager::{CacheManager, CacheManagerBuilder, DEFAULT_ROUTE_PREFIX};
pub use application::resolvers::{CacheResolver, ResolverError};
pub use application::routing::{RouteGenerator, RouteParams, RouterError};
pub use application::signer::UrlSigner;
pub use config::{CacheSettings, Settings, SettingsError};
pub use domain::artifact::Artifact;
pub use domain::filters::{FilterConfig, FilterRegistry};
pub use infra::memory::MemoryResolver;
pub use infra::routing::PathPrefixRouter;
pub use infra::web_path::WebPathResolver;
