use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use docsearch::SimilarityHit;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query parameters for keyword search
#[derive(Debug, Deserialize)]
pub struct KeywordSearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Query parameters for similarity search
#[derive(Debug, Deserialize)]
pub struct SimilaritySearchQuery {
    #[serde(default)]
    pub q: Option<String>,

    /// Kept as text so a malformed value gets a clear 400 message.
    #[serde(default)]
    pub k: Option<String>,
}

/// Summary plus the raw engine results it was written from.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(rename = "LLM Output")]
    pub llm_output: String,
    pub raw_output: Vec<T>,
}

fn parse_top_k(raw: Option<&str>) -> ServerResult<Option<usize>> {
    match raw {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| {
                ServerError::BadRequest(format!("k must be a positive integer, got {value:?}"))
            }),
    }
}

/// Keyword search, then a summary of the matching ids
pub async fn search_keyword(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<KeywordSearchQuery>, QueryRejection>,
) -> ServerResult<impl IntoResponse> {
    let Query(query) = query?;

    let outcome = state.service.keyword_search(query.q.as_deref()).await?;

    Ok(Json(SearchResponse {
        llm_output: outcome.summary,
        raw_output: outcome.document_ids,
    }))
}

/// Top-k nearest documents by embedding, then a summary of them
pub async fn search_similarity(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<SimilaritySearchQuery>, QueryRejection>,
) -> ServerResult<impl IntoResponse> {
    let Query(query) = query?;
    let k = parse_top_k(query.k.as_deref())?;

    let outcome = state
        .service
        .similarity_search(query.q.as_deref(), k)
        .await?;

    Ok(Json(SearchResponse::<SimilarityHit> {
        llm_output: outcome.summary,
        raw_output: outcome.hits,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_k() {
        assert_eq!(parse_top_k(None).unwrap(), None);
        assert_eq!(parse_top_k(Some("5")).unwrap(), Some(5));
        assert_eq!(parse_top_k(Some(" 2 ")).unwrap(), Some(2));
        assert!(parse_top_k(Some("abc")).is_err());
        assert!(parse_top_k(Some("-1")).is_err());
        assert!(parse_top_k(Some("")).is_err());
    }

    #[test]
    fn test_response_field_names() {
        let body = serde_json::to_value(SearchResponse {
            llm_output: "Hello!".into(),
            raw_output: vec!["a".to_string()],
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "LLM Output": "Hello!", "raw_output": ["a"] })
        );
    }
}
