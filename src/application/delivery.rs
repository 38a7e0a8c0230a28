//! On-demand generation: the flow behind a dereferenced generation URL.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::application::error::CacheError;
use crate::application::manager::CacheManager;
use crate::domain::artifact::Artifact;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("source asset `{path}` could not be loaded")]
    SourceMissing { path: String },
    #[error("transformation `{filter}` failed: {message}")]
    Transform { filter: String, message: String },
}

impl DeliveryError {
    pub fn source_missing(path: impl Into<String>) -> Self {
        Self::SourceMissing { path: path.into() }
    }

    pub fn transform(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

/// Maps a logical asset path to its source bytes.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    async fn find(&self, filter: &str, path: &str) -> Result<Artifact, DeliveryError>;
}

/// Applies a named filter to a source artifact.
#[async_trait]
pub trait TransformEngine: Send + Sync {
    async fn apply(&self, source: &Artifact, filter: &str) -> Result<Artifact, DeliveryError>;
}

/// Serves filtered assets, generating and caching them on first access.
#[derive(Clone)]
pub struct DeliveryService {
    loader: Arc<dyn SourceLoader>,
    engine: Arc<dyn TransformEngine>,
    cache: Arc<CacheManager>,
}

impl DeliveryService {
    pub fn new(
        loader: Arc<dyn SourceLoader>,
        engine: Arc<dyn TransformEngine>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            loader,
            engine,
            cache,
        }
    }

    /// Resolve the browser-facing locator for a filtered asset, generating
    /// and storing the artifact first when the cache misses.
    pub async fn deliver(&self, path: &str, filter: &str) -> Result<String, DeliveryError> {
        if !self.cache.is_stored(path, filter).await? {
            debug!(path, filter, "Generating filtered asset on demand");
            let source = self.loader.find(filter, path).await?;
            let transformed = self.engine.apply(&source, filter).await?;
            self.cache.store(&transformed, path, filter).await?;
        }
        Ok(self.cache.resolve(path, filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::application::manager::CacheManager;
    use crate::application::routing::{RouteGenerator, RouteParams, RouterError};
    use crate::application::signer::UrlSigner;
    use crate::domain::filters::FilterRegistry;
    use crate::infra::memory::MemoryResolver;

    struct NullRouter;

    impl RouteGenerator for NullRouter {
        fn generate(
            &self,
            route: &str,
            _params: &RouteParams,
            _absolute: bool,
        ) -> Result<String, RouterError> {
            Err(RouterError::unknown_route(route))
        }
    }

    struct StaticLoader {
        finds: AtomicUsize,
    }

    #[async_trait]
    impl SourceLoader for StaticLoader {
        async fn find(&self, _filter: &str, path: &str) -> Result<Artifact, DeliveryError> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            if path == "missing.jpg" {
                return Err(DeliveryError::source_missing(path));
            }
            Ok(Artifact::from_format(&b"source"[..], "jpeg"))
        }
    }

    struct PassthroughEngine {
        applied: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TransformEngine for PassthroughEngine {
        async fn apply(&self, source: &Artifact, filter: &str) -> Result<Artifact, DeliveryError> {
            self.applied.lock().expect("applied lock").push(filter.to_string());
            Ok(Artifact::new(
                source.content.clone(),
                source.mime_type.clone(),
                source.format.clone(),
            ))
        }
    }

    fn service() -> (DeliveryService, Arc<StaticLoader>, Arc<PassthroughEngine>) {
        let resolver = Arc::new(MemoryResolver::new("http://cdn", 16));
        let manager = CacheManager::builder(
            Arc::new(FilterRegistry::default()),
            Arc::new(NullRouter),
            UrlSigner::new("aSecret"),
        )
        .bind("memory", resolver)
        .default_resolver("memory")
        .build();

        let loader = Arc::new(StaticLoader {
            finds: AtomicUsize::new(0),
        });
        let engine = Arc::new(PassthroughEngine {
            applied: Mutex::new(Vec::new()),
        });
        let service = DeliveryService::new(loader.clone(), engine.clone(), Arc::new(manager));
        (service, loader, engine)
    }

    #[tokio::test]
    async fn a_miss_generates_stores_and_resolves() {
        let (service, loader, engine) = service();

        let locator = service.deliver("img.jpg", "thumbnail").await.expect("deliver");
        assert_eq!(locator, "http://cdn/thumbnail/img.jpg");
        assert_eq!(loader.finds.load(Ordering::SeqCst), 1);
        assert_eq!(
            engine.applied.lock().expect("applied lock").clone(),
            vec!["thumbnail".to_string()]
        );
    }

    #[tokio::test]
    async fn a_hit_skips_generation_entirely() {
        let (service, loader, _engine) = service();

        service.deliver("img.jpg", "thumbnail").await.expect("first");
        let locator = service.deliver("img.jpg", "thumbnail").await.expect("second");
        assert_eq!(locator, "http://cdn/thumbnail/img.jpg");
        assert_eq!(loader.finds.load(Ordering::SeqCst), 1, "loader ran once");
    }

    #[tokio::test]
    async fn missing_sources_propagate() {
        let (service, _loader, engine) = service();

        let err = service
            .deliver("missing.jpg", "thumbnail")
            .await
            .expect_err("missing source");
        assert!(matches!(err, DeliveryError::SourceMissing { .. }));
        assert!(engine.applied.lock().expect("applied lock").is_empty());
    }
}
