//! Cache manager: resolver dispatch, fallback URL generation, and batched
//! invalidation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::application::error::CacheError;
use crate::application::resolvers::CacheResolver;
use crate::application::routing::{RouteGenerator, RouteParams};
use crate::application::signer::UrlSigner;
use crate::domain::artifact::Artifact;
use crate::domain::filters::FilterRegistry;

/// Route-name prefix for generated filter routes.
pub const DEFAULT_ROUTE_PREFIX: &str = "_imagine";

/// Dispatches cache operations to the resolver backend bound for each
/// filter, synthesizes signed generation URLs on cache misses, and batches
/// removal requests by backend instance.
///
/// The binding table is established once through [`CacheManagerBuilder`] and
/// immutable afterwards; the manager itself holds no mutable state.
pub struct CacheManager {
    filters: Arc<FilterRegistry>,
    router: Arc<dyn RouteGenerator>,
    signer: UrlSigner,
    resolvers: HashMap<String, Arc<dyn CacheResolver>>,
    default_resolver: Option<String>,
    route_prefix: String,
}

/// Startup-time registration API for [`CacheManager`].
pub struct CacheManagerBuilder {
    filters: Arc<FilterRegistry>,
    router: Arc<dyn RouteGenerator>,
    signer: UrlSigner,
    resolvers: HashMap<String, Arc<dyn CacheResolver>>,
    default_resolver: Option<String>,
    route_prefix: String,
}

impl CacheManagerBuilder {
    /// Bind a resolver under a backend name. A later binding for the same
    /// name replaces the earlier one.
    pub fn bind(mut self, name: impl Into<String>, resolver: Arc<dyn CacheResolver>) -> Self {
        self.resolvers.insert(name.into(), resolver);
        self
    }

    /// Backend name used by filters that do not declare one.
    pub fn default_resolver(mut self, name: impl Into<String>) -> Self {
        self.default_resolver = Some(name.into());
        self
    }

    /// Route-name prefix for generated filter routes.
    pub fn route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into();
        self
    }

    pub fn build(self) -> CacheManager {
        CacheManager {
            filters: self.filters,
            router: self.router,
            signer: self.signer,
            resolvers: self.resolvers,
            default_resolver: self.default_resolver,
            route_prefix: self.route_prefix,
        }
    }
}

impl CacheManager {
    pub fn builder(
        filters: Arc<FilterRegistry>,
        router: Arc<dyn RouteGenerator>,
        signer: UrlSigner,
    ) -> CacheManagerBuilder {
        CacheManagerBuilder {
            filters,
            router,
            signer,
            resolvers: HashMap::new(),
            default_resolver: None,
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
        }
    }

    /// The resolver bound for a filter: the backend its configuration names,
    /// falling back to the configured default.
    fn resolver_for(&self, filter: &str) -> Result<Arc<dyn CacheResolver>, CacheError> {
        if filter.is_empty() {
            return Err(CacheError::binding_not_found(filter));
        }
        let requested = self
            .filters
            .get(filter)
            .and_then(|config| config.resolver_name());
        requested
            .or(self.default_resolver.as_deref())
            .and_then(|name| self.resolvers.get(name))
            .cloned()
            .ok_or_else(|| CacheError::binding_not_found(filter))
    }

    /// Whether an artifact is already cached for the path and filter.
    ///
    /// Every call round-trips to the backend; the backend is authoritative.
    pub async fn is_stored(&self, path: &str, filter: &str) -> Result<bool, CacheError> {
        self.is_stored_variant(path, filter, "").await
    }

    /// [`Self::is_stored`] with a key suffix that versions the same
    /// path/filter pair (e.g. retina variants) without changing the
    /// filter's identity.
    pub async fn is_stored_variant(
        &self,
        path: &str,
        filter: &str,
        key_suffix: &str,
    ) -> Result<bool, CacheError> {
        let resolver = self.resolver_for(filter)?;
        let key = format!("{filter}{key_suffix}");
        Ok(resolver.is_stored(path, &key).await?)
    }

    /// The locator of the cached artifact, verbatim from the backend.
    pub async fn resolve(&self, path: &str, filter: &str) -> Result<String, CacheError> {
        self.resolve_variant(path, filter, "").await
    }

    /// [`Self::resolve`] with a key suffix.
    pub async fn resolve_variant(
        &self,
        path: &str,
        filter: &str,
        key_suffix: &str,
    ) -> Result<String, CacheError> {
        if is_traversal(path) {
            debug!(path, filter, "Rejected parent-directory path before dispatch");
            return Err(CacheError::path_traversal(path));
        }
        let resolver = self.resolver_for(filter)?;
        let key = format!("{filter}{key_suffix}");
        Ok(resolver.resolve(path, &key).await?)
    }

    /// Browser-facing location for the filtered asset: the cached locator
    /// when stored, otherwise a signed URL that triggers on-demand
    /// generation. Exactly one of the two sub-operations runs per call.
    pub async fn browser_path(
        &self,
        path: &str,
        filter: &str,
        absolute: bool,
    ) -> Result<String, CacheError> {
        if self.is_stored(path, filter).await? {
            counter!("refract_cache_hit_total").increment(1);
            self.resolve(path, filter).await
        } else {
            counter!("refract_cache_miss_total").increment(1);
            self.generate_url(path, filter, absolute)
        }
    }

    /// Build the signed URL that generates and stores the artifact when a
    /// client dereferences it. Pure string construction; no storage I/O.
    pub fn generate_url(
        &self,
        path: &str,
        filter: &str,
        absolute: bool,
    ) -> Result<String, CacheError> {
        if filter.is_empty() {
            return Err(CacheError::binding_not_found(filter));
        }

        let config = self.filters.get(filter);
        let target = match config.and_then(|config| config.format.as_deref()) {
            Some(format) => rewrite_extension(path, format),
            None => path.to_string(),
        };

        let mut params = RouteParams::new(target.trim_start_matches('/'));
        if let Some(config) = config
            && !config.filters.is_empty()
        {
            params
                .extra
                .insert("filters".to_string(), Value::Object(config.filters.clone()));
        }

        let route = format!("{}_{}", self.route_prefix, filter);
        let generated = self.router.generate(&route, &params, absolute)?;

        // routers URL-encode the path parameter; the generated URL must
        // carry the literal path exactly as supplied
        let encoded: String = form_urlencoded::byte_serialize(params.path.as_bytes()).collect();
        let url = generated.replace(&encoded, &params.path);

        Ok(self.signer.sign(&url))
    }

    /// Persist a transformed artifact with the filter's backend.
    pub async fn store(
        &self,
        artifact: &Artifact,
        path: &str,
        filter: &str,
    ) -> Result<(), CacheError> {
        let resolver = self.resolver_for(filter)?;
        resolver.store(artifact, path, filter).await?;
        Ok(())
    }

    /// Invalidate cached artifacts.
    ///
    /// `filters: None` expands to every registered filter name; `paths:
    /// None` means every path the backends know about. Filter names are
    /// grouped by the resolver instance they resolve to, and exactly one
    /// `remove` call is issued per distinct backend.
    pub async fn remove(
        &self,
        paths: Option<Vec<String>>,
        filters: Option<Vec<String>>,
    ) -> Result<(), CacheError> {
        let filters = match filters {
            Some(list) => list,
            None => self.filters.names().map(str::to_string).collect(),
        };
        // an empty path list is the "all paths" marker, interpreted by the
        // backend
        let paths: Vec<String> = paths
            .unwrap_or_default()
            .into_iter()
            .filter(|path| !path.is_empty())
            .collect();

        let mut groups: Vec<(Arc<dyn CacheResolver>, Vec<String>)> = Vec::new();
        let mut seen = HashSet::new();
        for filter in filters.into_iter().filter(|name| !name.is_empty()) {
            if !seen.insert(filter.clone()) {
                continue;
            }
            let resolver = self.resolver_for(&filter)?;
            match groups
                .iter_mut()
                .find(|(candidate, _)| Arc::ptr_eq(candidate, &resolver))
            {
                Some((_, names)) => names.push(filter),
                None => groups.push((resolver, vec![filter])),
            }
        }

        for (resolver, names) in &groups {
            debug!(
                filters = ?names,
                scoped_paths = paths.len(),
                "Issuing batched cache removal"
            );
            resolver.remove(&paths, names).await?;
            counter!("refract_cache_removal_total").increment(1);
        }
        Ok(())
    }
}

fn is_traversal(path: &str) -> bool {
    path.contains("/../") || path.starts_with("../")
}

/// Rewrite `path`'s extension to `format`, preserving the directory
/// component. Paths already carrying the format are left untouched.
fn rewrite_extension(path: &str, format: &str) -> String {
    let (dir, file) = match path.rfind('/') {
        Some(index) => (&path[..index], &path[index + 1..]),
        None => ("", path),
    };
    let (stem, extension) = match file.rfind('.') {
        Some(index) => (&file[..index], Some(&file[index + 1..])),
        None => (file, None),
    };
    if extension == Some(format) {
        return path.to_string();
    }
    // a bare backslash is the platform marker for an empty root
    let dir = if dir == "\\" { "" } else { dir };
    if dir.is_empty() {
        format!("{stem}.{format}")
    } else {
        format!("{dir}/{stem}.{format}")
    }
}
