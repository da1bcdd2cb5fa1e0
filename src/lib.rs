//! Workspace umbrella crate for docsearch.
//!
//! [`DocumentService`] wires the embedding client, the search engine client and
//! the summarizer together. Each of its operations is one HTTP endpoint of the
//! server crate: validate input, call the collaborators in a fixed order, shape
//! the result. No state survives a call except the clients themselves.

pub mod config;

pub use config::{
    ConfigLoadError, DocsearchConfig, KEYWORD_SEARCH_PROMPT, PromptConfig,
    SIMILARITY_SEARCH_PROMPT, SearchConfig,
};
pub use index::{
    DocumentRecord, EngineConfig, InMemoryBackend, IndexError, SearchBackend, SimilarityHit,
    StoredDocument, build_backend,
};
pub use semantic::{Embedder, SemanticConfig, SemanticError, StubEmbedder, build_embedder};
pub use summarize::{
    CompletionConfig, StubSummarizer, Summarizer, SummaryError, build_summarizer,
};

use std::fmt;
use std::sync::Arc;

/// Produces the id of a newly stored document. Must never repeat.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Random UUID v4, the production id scheme.
pub fn uuid_id_generator() -> IdGenerator {
    Arc::new(|| uuid::Uuid::new_v4().to_string())
}

/// Which search endpoint a request came through. Only affects error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Keyword,
    Similarity,
}

/// Errors that can occur while serving a document or search request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("Text not provided")]
    MissingText,
    #[error("{}", missing_query_message(.0))]
    MissingQuery(SearchKind),
    #[error("k must be between 1 and {max}, got {k}")]
    InvalidTopK { k: usize, max: usize },
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Embedding(#[from] SemanticError),
    /// Not-found text is the engine's own response, passed through untouched.
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

fn missing_query_message(kind: &SearchKind) -> &'static str {
    match kind {
        SearchKind::Keyword => "Search query must be provided in the \"q\" parameter.",
        SearchKind::Similarity => "Query text not provided",
    }
}

impl PipelineError {
    /// True when the engine reported the requested document as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::Index(err) if err.is_not_found())
    }

    /// True for errors caused by the caller's input rather than a collaborator.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingText
                | PipelineError::MissingQuery(_)
                | PipelineError::InvalidTopK { .. }
        )
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value.to_string())
    }
}

/// Result of a keyword search: the model's summary plus the untouched ids.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSearchOutcome {
    pub summary: String,
    pub document_ids: Vec<String>,
}

/// Result of a similarity search: the model's summary plus the untouched hits.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilaritySearchOutcome {
    pub summary: String,
    pub hits: Vec<SimilarityHit>,
}

/// Stores documents and answers searches over them.
///
/// Cheap to share behind an `Arc`; every collaborator is itself `Send + Sync`.
#[derive(Clone)]
pub struct DocumentService {
    embedder: Arc<dyn Embedder>,
    backend: Arc<dyn SearchBackend>,
    summarizer: Arc<dyn Summarizer>,
    id_generator: IdGenerator,
    search: SearchConfig,
}

impl fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentService")
            .field("embedder", &self.embedder.model_name())
            .field("backend", &self.backend.name())
            .field("summarizer", &self.summarizer.model_name())
            .field("search", &self.search)
            .finish()
    }
}

impl DocumentService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        backend: Arc<dyn SearchBackend>,
        summarizer: Arc<dyn Summarizer>,
        search: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            backend,
            summarizer,
            id_generator: uuid_id_generator(),
            search,
        }
    }

    /// Replace the id scheme, e.g. with a counter in tests.
    pub fn with_id_generator(mut self, id_generator: IdGenerator) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Validate `config` and build every client it describes.
    pub fn from_config(config: &DocsearchConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let embedder = build_embedder(&config.embedding)?;
        let backend = build_backend(&config.engine)?;
        let summarizer = build_summarizer(&config.completion)?;
        tracing::info!(
            backend = backend.name(),
            index = %config.engine.index_name,
            embedding_model = embedder.model_name(),
            completion_model = summarizer.model_name(),
            "document service configured"
        );
        Ok(Self::new(
            embedder,
            backend,
            summarizer,
            config.search.clone(),
        ))
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Create the document index sized for the embedder's vectors.
    pub async fn ensure_index(&self) -> Result<(), PipelineError> {
        self.backend
            .ensure_index(self.embedder.dimensions())
            .await?;
        Ok(())
    }

    /// Engine reachability, for readiness probes.
    pub async fn ping(&self) -> Result<(), PipelineError> {
        self.backend.ping().await?;
        Ok(())
    }

    /// Embed and index `text` under a fresh id, returning that id.
    ///
    /// Nothing is written when embedding fails.
    pub async fn store(&self, text: Option<&str>) -> Result<String, PipelineError> {
        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => return Err(PipelineError::MissingText),
        };

        let id = (self.id_generator)();
        let embedding = self.embedder.embed(text).await?;
        self.backend
            .index_document(&DocumentRecord {
                id: id.clone(),
                text: text.to_string(),
                embedding,
            })
            .await?;

        tracing::info!(document_id = %id, chars = text.len(), "document stored");
        Ok(id)
    }

    pub async fn keyword_search(
        &self,
        query: Option<&str>,
    ) -> Result<KeywordSearchOutcome, PipelineError> {
        let query = non_empty(query).ok_or(PipelineError::MissingQuery(SearchKind::Keyword))?;

        let document_ids = self.backend.keyword_query(query).await?;
        tracing::debug!(hits = document_ids.len(), "keyword search finished");

        let summary = self
            .summarize(&self.search.prompts.keyword_search, &document_ids)
            .await?;
        Ok(KeywordSearchOutcome {
            summary,
            document_ids,
        })
    }

    /// Nearest neighbours of `query`'s embedding. `k` falls back to
    /// `search.default_top_k`.
    pub async fn similarity_search(
        &self,
        query: Option<&str>,
        k: Option<usize>,
    ) -> Result<SimilaritySearchOutcome, PipelineError> {
        let query =
            non_empty(query).ok_or(PipelineError::MissingQuery(SearchKind::Similarity))?;
        let k = self.resolve_top_k(k)?;

        let vector = self.embedder.embed(query).await?;
        let hits = self.backend.similarity_query(&vector, k).await?;
        tracing::debug!(k, hits = hits.len(), "similarity search finished");

        let summary = self
            .summarize(&self.search.prompts.similarity_search, &hits)
            .await?;
        Ok(SimilaritySearchOutcome { summary, hits })
    }

    pub async fn list_document_ids(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.backend.list_document_ids().await?)
    }

    pub async fn get_document_text(&self, id: &str) -> Result<String, PipelineError> {
        Ok(self.backend.get_document(id).await?.text)
    }

    fn resolve_top_k(&self, k: Option<usize>) -> Result<usize, PipelineError> {
        let k = k.unwrap_or(self.search.default_top_k);
        if k == 0 || k > self.search.max_top_k {
            return Err(PipelineError::InvalidTopK {
                k,
                max: self.search.max_top_k,
            });
        }
        Ok(k)
    }

    async fn summarize<T: serde::Serialize>(
        &self,
        system_prompt: &str,
        results: &T,
    ) -> Result<String, PipelineError> {
        let content = serde_json::to_string(results)
            .map_err(|e| PipelineError::Summary(SummaryError::InvalidResponse(e.to_string())))?;
        Ok(self.summarizer.summarize(system_prompt, &content).await?)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> DocumentService {
        DocumentService::new(
            Arc::new(StubEmbedder::with_dimensions(8)),
            Arc::new(InMemoryBackend::new()),
            Arc::new(StubSummarizer::new()),
            SearchConfig::default(),
        )
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(PipelineError::MissingText.to_string(), "Text not provided");
        assert_eq!(
            PipelineError::MissingQuery(SearchKind::Keyword).to_string(),
            "Search query must be provided in the \"q\" parameter."
        );
        assert_eq!(
            PipelineError::MissingQuery(SearchKind::Similarity).to_string(),
            "Query text not provided"
        );
        let body = r#"{"_index":"documents","_id":"x","found":false}"#;
        let err = PipelineError::from(IndexError::NotFound(body.into()));
        assert_eq!(err.to_string(), body);
        assert!(err.is_not_found());
        assert!(!err.is_invalid_input());
        assert!(PipelineError::MissingText.is_invalid_input());
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let generate = uuid_id_generator();
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_resolve_top_k() {
        let svc = service();
        assert_eq!(svc.resolve_top_k(None).unwrap(), 3);
        assert_eq!(svc.resolve_top_k(Some(1)).unwrap(), 1);
        assert!(matches!(
            svc.resolve_top_k(Some(0)),
            Err(PipelineError::InvalidTopK { k: 0, .. })
        ));
        assert!(svc.resolve_top_k(Some(10_001)).is_err());
    }

    #[tokio::test]
    async fn test_store_rejects_missing_text_before_any_call() {
        let svc = service();
        svc.ensure_index().await.unwrap();
        for input in [None, Some("")] {
            assert!(matches!(
                svc.store(input).await,
                Err(PipelineError::MissingText)
            ));
        }
        assert!(svc.list_document_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_uses_injected_ids() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ids = Arc::clone(&counter);
        let svc = service().with_id_generator(Arc::new(move || {
            format!("doc-{}", ids.fetch_add(1, Ordering::SeqCst))
        }));
        svc.ensure_index().await.unwrap();

        assert_eq!(svc.store(Some("first")).await.unwrap(), "doc-0");
        assert_eq!(svc.store(Some("second")).await.unwrap(), "doc-1");
        assert_eq!(svc.get_document_text("doc-1").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_missing_queries() {
        let svc = service();
        assert!(matches!(
            svc.keyword_search(Some("")).await,
            Err(PipelineError::MissingQuery(SearchKind::Keyword))
        ));
        assert!(matches!(
            svc.similarity_search(None, Some(2)).await,
            Err(PipelineError::MissingQuery(SearchKind::Similarity))
        ));
    }

    #[tokio::test]
    async fn test_whitespace_is_valid_text_and_query() {
        let svc = service();
        svc.ensure_index().await.unwrap();

        let id = svc.store(Some("   ")).await.unwrap();
        assert_eq!(svc.get_document_text(&id).await.unwrap(), "   ");

        let outcome = svc.keyword_search(Some(" ")).await.unwrap();
        assert!(outcome.document_ids.is_empty());
        let outcome = svc.similarity_search(Some(" "), Some(1)).await.unwrap();
        assert_eq!(outcome.hits.len(), 1);
    }

    #[tokio::test]
    async fn test_store_fails_without_index() {
        let svc = service();
        let err = svc.store(Some("text")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Index(IndexError::Backend(_))));
    }

    #[test]
    fn test_from_config_offline() {
        let svc = DocumentService::from_config(&DocsearchConfig::offline(4)).unwrap();
        assert_eq!(svc.backend().name(), "in_memory");
        assert_eq!(svc.search_config().default_top_k, 3);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let err = DocumentService::from_config(&DocsearchConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
