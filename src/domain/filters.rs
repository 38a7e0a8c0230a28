//! Filter configuration: the per-filter settings the cache layer consults.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Configuration for a single named filter.
///
/// Owned by the configuration layer; read-only to the cache manager.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FilterConfig {
    /// Forced output format. When set, generated URLs rewrite the source
    /// path's extension to this format.
    #[serde(default)]
    pub format: Option<String>,

    /// Name of the resolver backend caching this filter's artifacts.
    /// Empty or absent means the process-wide default resolver.
    #[serde(default)]
    pub cache: Option<String>,

    /// Declarative transformation parameters (e.g. a named crop region with
    /// start offset and size) forwarded verbatim to the transformation
    /// engine through generated URLs. Opaque to the cache layer.
    #[serde(default)]
    pub filters: serde_json::Map<String, Value>,
}

impl FilterConfig {
    /// The resolver name this filter requests, if it names one explicitly.
    pub fn resolver_name(&self) -> Option<&str> {
        self.cache.as_deref().filter(|name| !name.is_empty())
    }
}

/// Read-only registry mapping filter names to their configuration.
///
/// Built once at startup and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: BTreeMap<String, FilterConfig>,
}

impl FilterRegistry {
    pub fn new(filters: BTreeMap<String, FilterConfig>) -> Self {
        Self { filters }
    }

    pub fn get(&self, name: &str) -> Option<&FilterConfig> {
        self.filters.get(name)
    }

    /// All configured filter names, in stable order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_name_means_default() {
        let config = FilterConfig {
            cache: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.resolver_name(), None);

        let config = FilterConfig {
            cache: Some("fs".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolver_name(), Some("fs"));
    }

    #[test]
    fn registry_exposes_names_in_stable_order() {
        let mut filters = BTreeMap::new();
        filters.insert("thumbnail".to_string(), FilterConfig::default());
        filters.insert("banner".to_string(), FilterConfig::default());
        let registry = FilterRegistry::new(filters);

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["banner", "thumbnail"]);
        assert!(registry.get("thumbnail").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn filter_config_deserializes_transformation_parameters() {
        let raw = serde_json::json!({
            "format": "png",
            "cache": "cdn",
            "filters": {
                "crop": { "start": [10, 20], "size": [120, 90] }
            }
        });
        let config: FilterConfig = serde_json::from_value(raw).expect("filter config");
        assert_eq!(config.format.as_deref(), Some("png"));
        assert_eq!(config.resolver_name(), Some("cdn"));
        assert!(config.filters.contains_key("crop"));
    }
}
