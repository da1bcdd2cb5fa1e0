//! # docsearch Index
//!
//! Client side of the external search engine that owns every stored document.
//! Nothing here indexes, ranks or persists on its own: full-text parsing,
//! vector scoring and storage all happen inside the engine, and this crate only
//! shapes requests and reads responses.
//!
//! ## Backends
//!
//! Every backend implements [`SearchBackend`]:
//!
//! - [`ElasticsearchBackend`] talks to an Elasticsearch cluster over its REST API.
//!   Documents live in one index with a `text` field and a `dense_vector`
//!   field named `text_vector`.
//! - [`InMemoryBackend`] keeps documents in a process-local map. It mirrors the
//!   engine's observable behavior closely enough for tests and demos.
//!
//! Use [`build_backend`] to pick one from an [`EngineConfig`].
//!
//! ## Scores
//!
//! Similarity scores are cosine similarity shifted by `+1.0`, so they fall in
//! `[0, 2]` and a query equal to a stored vector scores `2.0`.
//!
//! ## Example Usage
//!
//! ```
//! use index::{build_backend, DocumentRecord, EngineConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = build_backend(&EngineConfig::in_memory()).unwrap();
//! backend.ensure_index(2).await.unwrap();
//! backend
//!     .index_document(&DocumentRecord {
//!         id: "doc-1".into(),
//!         text: "hello rust".into(),
//!         embedding: vec![1.0, 0.0],
//!     })
//!     .await
//!     .unwrap();
//!
//! let hits = backend.similarity_query(&[1.0, 0.0], 5).await.unwrap();
//! assert_eq!(hits[0].document_id, "doc-1");
//! assert!((hits[0].score - 2.0).abs() < 1e-6);
//! # }
//! ```

pub mod config;
pub mod query;

mod elastic;
mod memory;

pub use config::EngineConfig;
pub use elastic::ElasticsearchBackend;
pub use memory::InMemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// A document as written to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A document as read back by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: String,
    pub text: String,
}

/// Result entry for a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    pub document_id: String,
    /// Shifted cosine similarity in `[0, 2]`, higher is more similar.
    pub score: f64,
}

#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// The engine has no document under the requested id. Holds the engine's
    /// own response text.
    #[error("{0}")]
    NotFound(String),
    #[error("engine request failed: {0}")]
    Http(String),
    #[error("engine returned {status}: {body}")]
    Engine { status: u16, body: String },
    #[error("invalid engine response: {0}")]
    InvalidResponse(String),
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("backend error: {0}")]
    Backend(String),
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound(_))
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        IndexError::Http(err.to_string())
    }
}

/// Operations the service needs from the search engine.
///
/// Implementations are shared by every in-flight request and must tolerate
/// concurrent calls.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Cheap reachability probe used by readiness checks.
    async fn ping(&self) -> Result<(), IndexError>;

    /// Create the document index with a vector field of `dims` dimensions
    /// unless it already exists. Idempotent.
    async fn ensure_index(&self, dims: usize) -> Result<(), IndexError>;

    /// Insert or replace the document stored under `record.id`.
    async fn index_document(&self, record: &DocumentRecord) -> Result<(), IndexError>;

    /// Fetch a document by id, [`IndexError::NotFound`] when absent.
    async fn get_document(&self, id: &str) -> Result<StoredDocument, IndexError>;

    /// Every document id currently stored. Unbounded.
    async fn list_document_ids(&self) -> Result<Vec<String>, IndexError>;

    /// Full-text query in the engine's native syntax. Ids in relevance order.
    async fn keyword_query(&self, query: &str) -> Result<Vec<String>, IndexError>;

    /// At most `k` hits ordered by descending shifted-cosine score.
    async fn similarity_query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SimilarityHit>, IndexError>;

    /// Short label for logs and readiness output.
    fn name(&self) -> &'static str;
}

/// Build the backend selected by `cfg.backend`.
pub fn build_backend(cfg: &EngineConfig) -> Result<Arc<dyn SearchBackend>, IndexError> {
    cfg.validate().map_err(IndexError::InvalidConfig)?;
    match cfg.backend.as_str() {
        "elasticsearch" => Ok(Arc::new(ElasticsearchBackend::new(cfg)?)),
        "in_memory" => Ok(Arc::new(InMemoryBackend::with_keyword_limit(
            cfg.keyword_result_size,
        ))),
        other => Err(IndexError::InvalidConfig(format!(
            "unknown engine backend {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_displays_engine_text_verbatim() {
        let body = r#"{"_index":"documents","_id":"nope","found":false}"#;
        let err = IndexError::NotFound(body.into());
        assert_eq!(err.to_string(), body);
        assert!(err.is_not_found());
        assert!(!IndexError::Http("x".into()).is_not_found());
    }

    #[test]
    fn similarity_hit_wire_shape() {
        let hit = SimilarityHit {
            document_id: "abc".into(),
            score: 1.5,
        };
        assert_eq!(
            serde_json::to_value(&hit).unwrap(),
            serde_json::json!({ "document_id": "abc", "score": 1.5 })
        );
    }

    #[test]
    fn build_in_memory_backend() {
        let backend = build_backend(&EngineConfig::in_memory()).unwrap();
        assert_eq!(backend.name(), "in_memory");
    }

    #[test]
    fn build_elasticsearch_backend() {
        let backend = build_backend(&EngineConfig::default()).unwrap();
        assert_eq!(backend.name(), "elasticsearch");
    }

    #[test]
    fn build_rejects_invalid_config() {
        let cfg = EngineConfig {
            backend: "sqlite".into(),
            ..Default::default()
        };
        assert!(matches!(
            build_backend(&cfg),
            Err(IndexError::InvalidConfig(_))
        ));
    }
}
