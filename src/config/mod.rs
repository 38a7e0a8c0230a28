//! Configuration layer: typed settings with layered precedence (file → env).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::application::manager::DEFAULT_ROUTE_PREFIX;
use crate::domain::filters::{FilterConfig, FilterRegistry};

const ENV_PREFIX: &str = "REFRACT";
const LOCAL_CONFIG_BASENAME: &str = "refract";
const DEFAULT_SIGN_SECRET: &str = "change-me";
const DEFAULT_MEMORY_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Runtime settings for the cache layer.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    /// Backend name used by filters that do not declare one.
    pub default_resolver: Option<String>,

    /// Route-name prefix for generated filter routes.
    pub route_prefix: String,

    /// Shared secret for URL signing. Override outside development.
    pub sign_secret: String,

    /// Entry capacity of the in-memory resolver backend.
    pub memory_capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_resolver: None,
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            sign_secret: DEFAULT_SIGN_SECRET.to_string(),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub cache: CacheSettings,
    pub filters: BTreeMap<String, FilterConfig>,
}

impl Settings {
    /// Load settings with file → environment precedence.
    ///
    /// Without an explicit path, a `refract.*` file in the working directory
    /// is read when present. `REFRACT`-prefixed environment variables
    /// override file values (`REFRACT_CACHE__SIGN_SECRET=…`).
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
        };
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// The immutable filter registry described by these settings.
    pub fn filter_registry(&self) -> Arc<FilterRegistry> {
        Arc::new(FilterRegistry::new(self.filters.clone()))
    }
}
