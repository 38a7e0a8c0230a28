//! Resolver traits describing cache storage backends.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::artifact::Artifact;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("cached artifact not found for `{path}`")]
    NotFound { path: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

impl ResolverError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// A cache storage backend.
///
/// One instance exists per configured backend name; the cache manager
/// dispatches every operation to the instance bound for a filter. The
/// backend is authoritative: nothing here is cached locally on its behalf.
#[async_trait]
pub trait CacheResolver: Send + Sync {
    /// Whether an artifact is already stored for the path under the key.
    async fn is_stored(&self, path: &str, key: &str) -> Result<bool, ResolverError>;

    /// A browser-accessible locator for the artifact.
    ///
    /// Backends that can synthesize a deterministic locator may succeed even
    /// for paths they have never stored; others fail with
    /// [`ResolverError::NotFound`].
    async fn resolve(&self, path: &str, key: &str) -> Result<String, ResolverError>;

    /// Persist an artifact for the path under the key.
    async fn store(&self, artifact: &Artifact, path: &str, key: &str)
    -> Result<(), ResolverError>;

    /// Remove stored artifacts.
    ///
    /// An empty `paths` slice means every path the backend knows about under
    /// the given keys. Backends are free to batch the deletion internally;
    /// callers issue at most one `remove` per backend instance.
    async fn remove(&self, paths: &[String], keys: &[String]) -> Result<(), ResolverError>;
}
