//! Filesystem-backed resolver serving artifacts from a public web root.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::resolvers::{CacheResolver, ResolverError};
use crate::domain::artifact::Artifact;

/// Resolver storing artifacts under `<root>/<key>/<path>` and resolving
/// them to `<base_url>/<key>/<path>`.
///
/// The root directory is expected to be served directly by the host web
/// server, so locators are synthesized deterministically without a
/// filesystem round-trip.
#[derive(Debug)]
pub struct WebPathResolver {
    root: PathBuf,
    base_url: String,
}

impl WebPathResolver {
    /// Initialise storage rooted at the provided directory, creating it if
    /// necessary.
    pub fn new(root: PathBuf, base_url: impl Into<String>) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolve the absolute filesystem location for a cached artifact.
    fn location(&self, path: &str, key: &str) -> Result<PathBuf, ResolverError> {
        let relative = Path::new(key).join(path.trim_start_matches('/'));
        if relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::Prefix(_) | Component::RootDir
            )
        }) {
            return Err(ResolverError::backend(format!(
                "path `{path}` escapes the cache root"
            )));
        }
        Ok(self.root.join(relative))
    }

    fn locator(&self, path: &str, key: &str) -> String {
        format!("{}/{key}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl CacheResolver for WebPathResolver {
    async fn is_stored(&self, path: &str, key: &str) -> Result<bool, ResolverError> {
        let location = self.location(path, key)?;
        match fs::metadata(&location).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ResolverError::Io(err)),
        }
    }

    async fn resolve(&self, path: &str, key: &str) -> Result<String, ResolverError> {
        // the public URL is deterministic; validate the path, skip the disk
        self.location(path, key)?;
        Ok(self.locator(path, key))
    }

    async fn store(
        &self,
        artifact: &Artifact,
        path: &str,
        key: &str,
    ) -> Result<(), ResolverError> {
        let location = self.location(path, key)?;
        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&location, &artifact.content).await?;
        debug!(path, key, bytes = artifact.len(), "Stored cached artifact");
        Ok(())
    }

    /// Missing files and directories are treated as success.
    async fn remove(&self, paths: &[String], keys: &[String]) -> Result<(), ResolverError> {
        if paths.is_empty() {
            for key in keys {
                let location = self.location("", key)?;
                match fs::remove_dir_all(&location).await {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(ResolverError::Io(err)),
                }
            }
            return Ok(());
        }

        for key in keys {
            for path in paths {
                let location = self.location(path, key)?;
                match fs::remove_file(&location).await {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(ResolverError::Io(err)),
                }
            }
        }
        Ok(())
    }
}
