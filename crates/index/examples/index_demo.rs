//! Store a few vectors in the in-memory backend and run both query kinds.
//!
//! Point `DOCSEARCH_DEMO_ES` at a cluster (e.g. `http://localhost:9200`) to run
//! the same calls against Elasticsearch instead.

use index::{build_backend, DocumentRecord, EngineConfig, IndexError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), IndexError> {
    let cfg = match std::env::var("DOCSEARCH_DEMO_ES") {
        Ok(url) => {
            let (scheme, rest) = url.split_once("://").unwrap_or(("http", url.as_str()));
            let (host, port) = rest.split_once(':').unwrap_or((rest, "9200"));
            EngineConfig {
                scheme: scheme.to_string(),
                host: host.to_string(),
                port: port.trim_end_matches('/').parse().unwrap_or(9200),
                index_name: "docsearch-demo".into(),
                ..Default::default()
            }
        }
        Err(_) => EngineConfig::in_memory(),
    };

    let backend = build_backend(&cfg)?;
    backend.ensure_index(3).await?;

    let records = [
        ("doc-1", "rust borrow checker guide", vec![0.9, 0.1, 0.0]),
        ("doc-2", "elasticsearch vector search", vec![0.1, 0.9, 0.2]),
        ("doc-3", "rust async and elasticsearch", vec![0.6, 0.6, 0.1]),
    ];
    let count = records.len();
    for (id, text, embedding) in records {
        backend
            .index_document(&DocumentRecord {
                id: id.into(),
                text: text.into(),
                embedding,
            })
            .await?;
    }
    println!("Indexed {count} documents into {}.", backend.name());

    let ids = backend.keyword_query("rust").await?;
    println!("keyword 'rust': {ids:?}");

    for hit in backend.similarity_query(&[1.0, 0.0, 0.0], 2).await? {
        println!("similar: {} score={:.4}", hit.document_id, hit.score);
    }

    println!("all ids: {:?}", backend.list_document_ids().await?);
    Ok(())
}
