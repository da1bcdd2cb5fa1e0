use crate::query::{self, SCROLL_KEEP_ALIVE};
use crate::{
    DocumentRecord, EngineConfig, IndexError, SearchBackend, SimilarityHit, StoredDocument,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Elasticsearch over its REST API.
///
/// Holds one pooled `reqwest::Client`; clones share the pool and the client is
/// safe for concurrent use from many tasks.
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    client: reqwest::Client,
    base_url: String,
    index: String,
    credentials: Option<(String, String)>,
    refresh_on_write: bool,
    keyword_result_size: usize,
}

impl ElasticsearchBackend {
    pub fn new(cfg: &EngineConfig) -> Result<Self, IndexError> {
        cfg.validate().map_err(IndexError::InvalidConfig)?;

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(!cfg.verify_certs)
            .build()
            .map_err(|e| IndexError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        let credentials = (!cfg.username.is_empty())
            .then(|| (cfg.username.clone(), cfg.password.clone()));

        Ok(Self {
            client,
            base_url: cfg.base_url(),
            index: cfg.index_name.clone(),
            credentials,
            refresh_on_write: cfg.refresh_on_write,
            keyword_result_size: cfg.keyword_result_size,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    fn doc_path(&self, id: &str) -> String {
        format!("{}/_doc/{}", self.index, urlencoding::encode(id))
    }

    async fn search(&self, path: &str, body: &Value) -> Result<Value, IndexError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        read_json(response).await
    }

    async fn clear_scroll(&self, scroll_id: String) {
        let result = self
            .request(Method::DELETE, "_search/scroll")
            .json(&serde_json::json!({ "scroll_id": scroll_id }))
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!(error = %e, "failed to clear scroll context");
        }
    }
}

/// `.` and `..` survive percent-encoding and would be collapsed by the URL
/// parser into a request for the index itself.
fn is_dot_segment(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b == b'.')
}

async fn read_json(response: Response) -> Result<Value, IndexError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IndexError::Engine {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| IndexError::InvalidResponse(format!("invalid JSON response: {e}")))
}

fn is_already_exists(body: &str) -> bool {
    body.contains("resource_already_exists_exception")
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn ping(&self) -> Result<(), IndexError> {
        let response = self.request(Method::HEAD, &self.index).send().await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(IndexError::Engine {
                status: 404,
                body: format!("index {:?} does not exist", self.index),
            }),
            s => Err(IndexError::Engine {
                status: s.as_u16(),
                body: String::new(),
            }),
        }
    }

    async fn ensure_index(&self, dims: usize) -> Result<(), IndexError> {
        let exists = self.request(Method::HEAD, &self.index).send().await?;
        match exists.status() {
            s if s.is_success() => {
                tracing::debug!(index = %self.index, "index already exists");
                return Ok(());
            }
            StatusCode::NOT_FOUND => {}
            s => {
                return Err(IndexError::Engine {
                    status: s.as_u16(),
                    body: exists.text().await.unwrap_or_default(),
                })
            }
        }

        let response = self
            .request(Method::PUT, &self.index)
            .json(&query::index_mapping(dims))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            tracing::info!(index = %self.index, dims, "created index");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && is_already_exists(&body) {
            // Lost a creation race with another instance.
            return Ok(());
        }
        Err(IndexError::Engine {
            status: status.as_u16(),
            body,
        })
    }

    async fn index_document(&self, record: &DocumentRecord) -> Result<(), IndexError> {
        let mut request = self
            .request(Method::PUT, &self.doc_path(&record.id))
            .json(&query::document_body(&record.text, &record.embedding));
        if self.refresh_on_write {
            request = request.query(&[("refresh", "wait_for")]);
        }
        read_json(request.send().await?).await?;
        tracing::debug!(id = %record.id, "indexed document");
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<StoredDocument, IndexError> {
        if id.is_empty() || is_dot_segment(id) {
            return Err(IndexError::NotFound(
                serde_json::json!({ "_index": self.index, "_id": id, "found": false })
                    .to_string(),
            ));
        }

        let response = self
            .request(Method::GET, &self.doc_path(id))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(IndexError::NotFound(body));
        }
        if !status.is_success() {
            return Err(IndexError::Engine {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| IndexError::InvalidResponse(format!("invalid JSON response: {e}")))?;
        match query::parse_source_text(&value)? {
            Some(text) => Ok(StoredDocument {
                id: id.to_string(),
                text,
            }),
            None => Err(IndexError::NotFound(body)),
        }
    }

    async fn list_document_ids(&self) -> Result<Vec<String>, IndexError> {
        let path = format!("{}/_search?scroll={}", self.index, SCROLL_KEEP_ALIVE);
        let mut page = self.search(&path, &query::scroll_start()).await?;
        let mut ids = Vec::new();

        loop {
            let batch = query::parse_hit_ids(&page)?;
            let scroll_id = query::parse_scroll_id(&page);
            if batch.is_empty() {
                if let Some(scroll_id) = scroll_id {
                    self.clear_scroll(scroll_id).await;
                }
                break;
            }
            ids.extend(batch);

            let Some(scroll_id) = scroll_id else {
                break;
            };
            page = self
                .search("_search/scroll", &query::scroll_next(&scroll_id))
                .await?;
        }

        tracing::debug!(count = ids.len(), "listed document ids");
        Ok(ids)
    }

    async fn keyword_query(&self, query: &str) -> Result<Vec<String>, IndexError> {
        let path = format!("{}/_search", self.index);
        let response = self
            .search(&path, &query::keyword_query(query, self.keyword_result_size))
            .await?;
        query::parse_hit_ids(&response)
    }

    async fn similarity_query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SimilarityHit>, IndexError> {
        let path = format!("{}/_search", self.index);
        let response = self
            .search(&path, &query::similarity_query(vector, k))
            .await?;
        query::parse_scored_hits(&response)
    }

    fn name(&self) -> &'static str {
        "elasticsearch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(cfg: EngineConfig) -> ElasticsearchBackend {
        ElasticsearchBackend::new(&cfg).unwrap()
    }

    #[test]
    fn doc_path_encodes_ids() {
        let es = backend(EngineConfig::default());
        assert_eq!(
            es.doc_path("6f1c9a1e-0000-4000-8000-000000000001"),
            "documents/_doc/6f1c9a1e-0000-4000-8000-000000000001"
        );
        assert_eq!(es.doc_path("a/b c"), "documents/_doc/a%2Fb%20c");
        assert_eq!(es.doc_path("a?b#c"), "documents/_doc/a%3Fb%23c");
    }

    #[test]
    fn dot_segments_detected() {
        assert!(is_dot_segment("."));
        assert!(is_dot_segment(".."));
        assert!(is_dot_segment("..."));
        assert!(!is_dot_segment(""));
        assert!(!is_dot_segment("a.b"));
        assert!(!is_dot_segment(".hidden"));
    }

    #[tokio::test]
    async fn dot_only_ids_are_not_found_without_a_request() {
        // Nothing listens on this port; a request would surface as an Http error.
        let es = backend(EngineConfig {
            host: "127.0.0.1".into(),
            port: 1,
            ..Default::default()
        });
        for id in [".", "..", ""] {
            let err = es.get_document(id).await.unwrap_err();
            assert!(err.is_not_found(), "id {id:?} gave {err:?}");
            assert!(err.to_string().contains("\"found\":false"));
        }
    }

    #[test]
    fn credentials_only_when_configured() {
        assert!(backend(EngineConfig::default()).credentials.is_none());

        let es = backend(EngineConfig {
            username: "elastic".into(),
            password: "changeme".into(),
            ..Default::default()
        });
        assert_eq!(
            es.credentials,
            Some(("elastic".to_string(), "changeme".to_string()))
        );
    }

    #[test]
    fn base_url_follows_config() {
        let es = backend(EngineConfig {
            scheme: "http".into(),
            host: "es.internal".into(),
            port: 9201,
            ..Default::default()
        });
        assert_eq!(es.base_url, "http://es.internal:9201");
    }

    #[test]
    fn detects_index_creation_race() {
        let body = r#"{"error":{"type":"resource_already_exists_exception"},"status":400}"#;
        assert!(is_already_exists(body));
        assert!(!is_already_exists(r#"{"error":{"type":"mapper_parsing_exception"}}"#));
    }

    #[tokio::test]
    async fn unreachable_engine_is_an_http_error() {
        let es = backend(EngineConfig {
            scheme: "http".into(),
            host: "127.0.0.1".into(),
            port: 9,
            request_timeout_secs: 2,
            ..Default::default()
        });
        assert!(matches!(es.ping().await, Err(IndexError::Http(_))));
        assert!(matches!(
            es.list_document_ids().await,
            Err(IndexError::Http(_))
        ));
    }
}
