use thiserror::Error;

/// Errors surfaced by an [`Embedder`](crate::Embedder).
#[derive(Debug, Clone, Error)]
pub enum SemanticError {
    /// Configuration is inconsistent (e.g., `api` mode without a key).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("embedding request failed: {0}")]
    Http(String),
    /// The provider answered with a non-success status.
    #[error("embedding API error {status}: {body}")]
    Api { status: u16, body: String },
    /// The provider answered 2xx but the body was not an embedding payload.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The vector length does not match the configured dimensionality.
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<reqwest::Error> for SemanticError {
    fn from(err: reqwest::Error) -> Self {
        SemanticError::Http(err.to_string())
    }
}
