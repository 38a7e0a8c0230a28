//! Bounded in-memory resolver backend.

use std::num::NonZeroUsize;
use std::sync::RwLock;

use async_trait::async_trait;
use lru::LruCache;

use crate::application::resolvers::{CacheResolver, ResolverError};
use crate::domain::artifact::Artifact;
use crate::infra::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::memory";

/// In-memory resolver for tests and single-process deployments.
///
/// Artifacts live in a bounded LRU map keyed by cache key and path.
/// Locators are synthesized from the configured base URL, but only for
/// artifacts the resolver actually holds.
pub struct MemoryResolver {
    base_url: String,
    entries: RwLock<LruCache<(String, String), Artifact>>,
}

impl MemoryResolver {
    pub fn new(base_url: impl Into<String>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of artifacts currently held.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn locator(&self, path: &str, key: &str) -> String {
        format!("{}/{key}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl CacheResolver for MemoryResolver {
    async fn is_stored(&self, path: &str, key: &str) -> Result<bool, ResolverError> {
        let found = rw_write(&self.entries, SOURCE, "is_stored")
            .get(&(key.to_string(), path.to_string()))
            .is_some();
        Ok(found)
    }

    async fn resolve(&self, path: &str, key: &str) -> Result<String, ResolverError> {
        let held = rw_write(&self.entries, SOURCE, "resolve")
            .get(&(key.to_string(), path.to_string()))
            .is_some();
        if !held {
            return Err(ResolverError::not_found(path));
        }
        Ok(self.locator(path, key))
    }

    async fn store(
        &self,
        artifact: &Artifact,
        path: &str,
        key: &str,
    ) -> Result<(), ResolverError> {
        rw_write(&self.entries, SOURCE, "store")
            .put((key.to_string(), path.to_string()), artifact.clone());
        Ok(())
    }

    async fn remove(&self, paths: &[String], keys: &[String]) -> Result<(), ResolverError> {
        let mut entries = rw_write(&self.entries, SOURCE, "remove");
        if paths.is_empty() {
            let doomed: Vec<(String, String)> = entries
                .iter()
                .filter(|((key, _), _)| keys.iter().any(|candidate| candidate == key))
                .map(|(entry_key, _)| entry_key.clone())
                .collect();
            for entry_key in doomed {
                entries.pop(&entry_key);
            }
        } else {
            for key in keys {
                for path in paths {
                    entries.pop(&(key.clone(), path.clone()));
                }
            }
        }
        Ok(())
    }
}
