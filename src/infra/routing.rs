//! Path-prefix route generation for filter routes.

use serde_json::Value;
use url::form_urlencoded;

use crate::application::manager::DEFAULT_ROUTE_PREFIX;
use crate::application::routing::{RouteGenerator, RouteParams, RouterError};

/// Generates filter callback URLs under a fixed mount point:
/// `<mount>/<filter>/<encoded-path>`, with transformation parameters
/// rendered as query parameters.
#[derive(Debug, Clone)]
pub struct PathPrefixRouter {
    mount: String,
    base_url: Option<String>,
    route_prefix: String,
}

impl PathPrefixRouter {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: normalize_mount(mount.into()),
            base_url: None,
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
        }
    }

    /// Base URL prepended when an absolute URL is requested.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Route-name prefix this router answers for. Must match the cache
    /// manager's prefix.
    pub fn with_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into();
        self
    }

    fn filter_from_route<'a>(&self, route: &'a str) -> Option<&'a str> {
        let rest = route.strip_prefix(self.route_prefix.as_str())?;
        let filter = rest.strip_prefix('_')?;
        (!filter.is_empty()).then_some(filter)
    }
}

impl RouteGenerator for PathPrefixRouter {
    fn generate(
        &self,
        route: &str,
        params: &RouteParams,
        absolute: bool,
    ) -> Result<String, RouterError> {
        let filter = self
            .filter_from_route(route)
            .ok_or_else(|| RouterError::unknown_route(route))?;

        let encoded_path: String =
            form_urlencoded::byte_serialize(params.path.as_bytes()).collect();
        let mut url = format!("{}/{filter}/{encoded_path}", self.mount);

        if !params.extra.is_empty() {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (name, value) in &params.extra {
                let rendered = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                query.append_pair(name, &rendered);
            }
            url.push('?');
            url.push_str(&query.finish());
        }

        if absolute {
            let base_url = self.base_url.as_deref().ok_or_else(|| {
                RouterError::generation("absolute URL requested but no base URL configured")
            })?;
            url = format!("{base_url}{url}");
        }
        Ok(url)
    }
}

fn normalize_mount(mount: String) -> String {
    let trimmed = mount.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
