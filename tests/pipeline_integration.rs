use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docsearch::{
    DocsearchConfig, DocumentService, Embedder, IdGenerator, InMemoryBackend, PipelineError,
    SearchConfig, SemanticError, StubEmbedder, StubSummarizer,
};

const DIMS: usize = 16;

fn sequential_ids() -> IdGenerator {
    let counter = Arc::new(AtomicUsize::new(1));
    Arc::new(move || format!("doc-{:04}", counter.fetch_add(1, Ordering::SeqCst)))
}

async fn offline_service() -> DocumentService {
    let service = DocumentService::from_config(&DocsearchConfig::offline(DIMS))
        .expect("offline config is valid")
        .with_id_generator(sequential_ids());
    service.ensure_index().await.expect("in-memory index");
    service
}

#[tokio::test]
async fn stored_document_round_trips_by_id() {
    let service = offline_service().await;
    let text = "Elasticsearch stores the text\nand its embedding.";

    let id = service.store(Some(text)).await.unwrap();
    assert_eq!(id, "doc-0001");
    assert_eq!(
        service.get_document_text(&id).await.unwrap(),
        text,
        "text must come back unchanged, line breaks included"
    );
}

#[tokio::test]
async fn every_store_yields_a_fresh_id() {
    let service = DocumentService::from_config(&DocsearchConfig::offline(DIMS)).unwrap();
    service.ensure_index().await.unwrap();

    let mut seen = HashSet::new();
    for i in 0..25 {
        let id = service.store(Some(&format!("document {i}"))).await.unwrap();
        assert!(seen.insert(id), "ids must never repeat");
    }
}

#[tokio::test]
async fn missing_text_never_creates_a_document() {
    let service = offline_service().await;
    service.store(Some("already here")).await.unwrap();

    for input in [None, Some("")] {
        let err = service.store(input).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingText));
    }
    assert_eq!(service.list_document_ids().await.unwrap().len(), 1);

    // Whitespace is still text.
    service.store(Some(" \t ")).await.unwrap();
    assert_eq!(service.list_document_ids().await.unwrap().len(), 2);
}

#[tokio::test]
async fn self_similarity_scores_highest() {
    let service = offline_service().await;
    let texts = [
        "rust ownership and borrowing",
        "python generators",
        "elasticsearch dense vectors",
        "cooking pasta al dente",
        "tokio async runtime",
    ];
    let mut ids = Vec::new();
    for text in texts {
        ids.push(service.store(Some(text)).await.unwrap());
    }

    let outcome = service
        .similarity_search(Some("elasticsearch dense vectors"), Some(4))
        .await
        .unwrap();

    assert_eq!(outcome.hits.len(), 4);
    assert_eq!(outcome.hits[0].document_id, ids[2]);
    assert!((outcome.hits[0].score - 2.0).abs() < 1e-5);
    for pair in outcome.hits.windows(2) {
        assert!(pair[0].score >= pair[1].score, "scores must not increase");
    }
    assert!(outcome.hits.iter().all(|h| (0.0..=2.0 + 1e-6).contains(&h.score)));
    assert!(!outcome.summary.is_empty());
}

#[tokio::test]
async fn top_k_defaults_and_is_respected() {
    let service = offline_service().await;
    for i in 0..6 {
        service.store(Some(&format!("note number {i}"))).await.unwrap();
    }

    let default_k = service
        .similarity_search(Some("note"), None)
        .await
        .unwrap();
    assert_eq!(default_k.hits.len(), SearchConfig::default().default_top_k);

    let one = service
        .similarity_search(Some("note"), Some(1))
        .await
        .unwrap();
    assert_eq!(one.hits.len(), 1);

    let more_than_stored = service
        .similarity_search(Some("note"), Some(50))
        .await
        .unwrap();
    assert_eq!(more_than_stored.hits.len(), 6);
}

#[tokio::test]
async fn zero_k_is_rejected() {
    let service = offline_service().await;
    let err = service
        .similarity_search(Some("anything"), Some(0))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidTopK { k: 0, .. }));
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let service = offline_service().await;
    let err = service.get_document_text("no-such-id").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn listing_matches_stored_ids() {
    let service = offline_service().await;
    let mut stored = HashSet::new();
    for i in 0..12 {
        stored.insert(service.store(Some(&format!("distinct text {i}"))).await.unwrap());
    }

    let listed = service.list_document_ids().await.unwrap();
    assert_eq!(listed.len(), 12);
    assert_eq!(listed.into_iter().collect::<HashSet<_>>(), stored);
}

#[tokio::test]
async fn keyword_search_keeps_raw_ids() {
    let service = offline_service().await;
    let a = service.store(Some("The quick brown fox")).await.unwrap();
    service.store(Some("A lazy dog sleeps")).await.unwrap();
    let c = service.store(Some("Fox and dog are friends")).await.unwrap();

    let outcome = service.keyword_search(Some("fox")).await.unwrap();
    assert_eq!(outcome.document_ids, vec![a, c]);
    assert!(!outcome.summary.is_empty());

    let empty = service.keyword_search(Some("zebra")).await.unwrap();
    assert!(empty.document_ids.is_empty());
    assert!(!empty.summary.is_empty());
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
        Err(SemanticError::Http("connection refused".into()))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn embedding_failure_writes_nothing() {
    let backend = Arc::new(InMemoryBackend::new());
    let service = DocumentService::new(
        Arc::new(FailingEmbedder),
        backend.clone(),
        Arc::new(StubSummarizer::new()),
        SearchConfig::default(),
    );
    service.ensure_index().await.unwrap();

    let err = service.store(Some("never indexed")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Embedding(_)));
    assert!(service.list_document_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_stores_share_one_service() {
    let service = Arc::new(DocumentService::new(
        Arc::new(StubEmbedder::with_dimensions(DIMS)),
        Arc::new(InMemoryBackend::new()),
        Arc::new(StubSummarizer::new()),
        SearchConfig::default(),
    ));
    service.ensure_index().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.store(Some(&format!("parallel document {i}"))).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap());
    }
    assert_eq!(ids.len(), 32);
    assert_eq!(service.list_document_ids().await.unwrap().len(), 32);
}
