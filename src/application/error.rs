//! Cache-layer error taxonomy.

use thiserror::Error;

use crate::application::resolvers::ResolverError;
use crate::application::routing::RouterError;

#[derive(Debug, Error)]
pub enum CacheError {
    /// No resolver bound for the filter and no usable default. A
    /// configuration defect, not a transient condition.
    #[error("no resolver available for filter `{filter}`")]
    BindingNotFound { filter: String },

    /// The path escapes the asset root. Rendered as a missing resource so
    /// callers cannot distinguish it from a legitimately absent asset.
    #[error("source asset `{path}` could not be found")]
    PathTraversal { path: String },

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Router(#[from] RouterError),
}

impl CacheError {
    pub fn binding_not_found(filter: impl Into<String>) -> Self {
        Self::BindingNotFound {
            filter: filter.into(),
        }
    }

    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Whether the error should surface as a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PathTraversal { .. } | Self::Resolver(ResolverError::NotFound { .. })
        )
    }
}
