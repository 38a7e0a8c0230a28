//! Transformed artifact values exchanged with cache backends.

use bytes::Bytes;

/// An immutable transformed artifact: the bytes produced by the
/// transformation engine plus the media metadata a backend needs to serve
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub content: Bytes,
    pub mime_type: String,
    pub format: String,
}

impl Artifact {
    pub fn new(
        content: impl Into<Bytes>,
        mime_type: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            mime_type: mime_type.into(),
            format: format.into(),
        }
    }

    /// Build an artifact from content and a bare format, deriving the mime
    /// type from the format extension. Unknown formats fall back to
    /// `application/octet-stream`.
    pub fn from_format(content: impl Into<Bytes>, format: impl Into<String>) -> Self {
        let format = format.into();
        let mime_type = mime_guess::from_ext(&format)
            .first_or_octet_stream()
            .to_string();
        Self {
            content: content.into(),
            mime_type,
            format,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
