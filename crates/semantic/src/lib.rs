//! docsearch embedding client
//!
//! Turns text into the dense vectors that get stored next to each document and
//! compared at query time. Nothing is computed locally in production: the text is
//! sent to an OpenAI-compatible embeddings endpoint and the returned vector is
//! checked against the configured dimensionality.
//!
//! Two modes:
//!
//! - **API mode** - one `POST` per call, bearer auth, no retry and no cache.
//! - **Stub mode** - deterministic hash-derived vectors for tests and offline runs.
//!
//! Line breaks are flattened to spaces before either mode sees the text
//! (see [`prepare_text`]).
//!
//! ## Quick example
//!
//! ```no_run
//! use semantic::{build_embedder, SemanticConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let embedder = build_embedder(&SemanticConfig::stub(8)).unwrap();
//!     let vector = embedder.embed("This is a test.").await.unwrap();
//!     assert_eq!(vector.len(), 8);
//! }
//! ```

pub mod config;
pub mod error;

mod api;
mod normalize;
mod stub;

pub use crate::api::ApiEmbedder;
pub use crate::config::SemanticConfig;
pub use crate::error::SemanticError;
pub use crate::normalize::prepare_text;
pub use crate::stub::StubEmbedder;

use async_trait::async_trait;
use std::sync::Arc;

/// Text to vector. Implementations are shared across concurrent requests.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError>;

    /// Length of every vector returned by [`embed`](Self::embed).
    fn dimensions(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Build the embedder selected by `cfg.mode`.
pub fn build_embedder(cfg: &SemanticConfig) -> Result<Arc<dyn Embedder>, SemanticError> {
    match cfg.mode.as_str() {
        "api" => Ok(Arc::new(ApiEmbedder::new(cfg)?)),
        "stub" => Ok(Arc::new(StubEmbedder::new(cfg)?)),
        other => Err(SemanticError::InvalidConfig(format!(
            "unknown embedding mode {other:?}"
        ))),
    }
}
