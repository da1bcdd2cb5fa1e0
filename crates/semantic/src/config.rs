use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration describing which embedding model to call and how.
///
/// # Example
/// ```no_run
/// use semantic::{build_embedder, SemanticConfig};
///
/// let cfg = SemanticConfig {
///     api_key: "sk-xxx".into(),
///     ..Default::default()
/// };
///
/// let embedder = build_embedder(&cfg).unwrap();
/// assert_eq!(embedder.dimensions(), 1536);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Embedding mode: `"api"` (remote HTTP) or `"stub"` (deterministic, offline).
    pub mode: String,
    /// Model identifier sent to the provider.
    pub model_name: String,
    /// Length of every vector this model produces. Stored documents and queries
    /// must agree on it, so responses of any other length are rejected.
    pub dimensions: usize,
    /// OpenAI-compatible embeddings endpoint.
    pub api_url: String,
    /// Bearer token for the provider. Required in `"api"` mode.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: u64,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            model_name: "text-embedding-3-small".into(),
            dimensions: 1536,
            api_url: "https://api.openai.com/v1/embeddings".into(),
            api_key: String::new(),
            api_timeout_secs: 30,
        }
    }
}

impl SemanticConfig {
    /// Deterministic offline configuration, handy for tests and local runs.
    pub fn stub(dimensions: usize) -> Self {
        Self {
            mode: "stub".into(),
            model_name: "stub".into(),
            dimensions,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Check the fields that must hold before any client is built.
    pub fn validate(&self) -> Result<(), String> {
        match self.mode.as_str() {
            "api" => {
                if self.api_key.trim().is_empty() {
                    return Err("embedding.api_key is required when embedding.mode is 'api'".into());
                }
                if self.api_url.trim().is_empty() {
                    return Err("embedding.api_url must not be empty".into());
                }
            }
            "stub" => {}
            other => {
                return Err(format!(
                    "embedding.mode must be one of [\"api\", \"stub\"], got {other:?}"
                ))
            }
        }
        if self.dimensions == 0 {
            return Err("embedding.dimensions must be >= 1".into());
        }
        if self.model_name.trim().is_empty() {
            return Err("embedding.model_name must not be empty".into());
        }
        Ok(())
    }
}
