//! Route generation seam to the host HTTP layer.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("unknown route `{route}`")]
    UnknownRoute { route: String },
    #[error("route generation failed: {message}")]
    Generation { message: String },
}

impl RouterError {
    pub fn unknown_route(route: impl Into<String>) -> Self {
        Self::UnknownRoute {
            route: route.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}

/// Parameters attached to a generated filter route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteParams {
    /// The source asset path, leading slashes stripped.
    pub path: String,
    /// Additional route parameters, e.g. the filter's declarative
    /// transformation parameters keyed `filters`.
    pub extra: serde_json::Map<String, Value>,
}

impl RouteParams {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Generates callback URLs for named filter routes.
///
/// Implementations are expected to URL-encode the path parameter; the cache
/// manager restores the literal path in the generated URL afterwards.
pub trait RouteGenerator: Send + Sync {
    fn generate(
        &self,
        route: &str,
        params: &RouteParams,
        absolute: bool,
    ) -> Result<String, RouterError>;
}
