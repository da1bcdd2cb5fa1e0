//! Elasticsearch request bodies and response parsing.
//!
//! Kept apart from the transport so the exact wire shapes can be unit tested
//! without a running cluster.

use crate::{IndexError, SimilarityHit};
use serde_json::{json, Value};

/// Field holding the raw document text.
pub const TEXT_FIELD: &str = "text";
/// Field holding the dense embedding.
pub const VECTOR_FIELD: &str = "text_vector";

/// Painless expression used for similarity scoring. The `+ 1.0` shift keeps
/// scores in `[0, 2]` because the engine rejects negative scores.
pub const COSINE_SCRIPT: &str = "cosineSimilarity(params.query_vector, 'text_vector') + 1.0";

/// Page size used while scrolling through every document id.
pub const SCROLL_PAGE_SIZE: usize = 1000;
pub const SCROLL_KEEP_ALIVE: &str = "1m";

pub(crate) fn index_mapping(dims: usize) -> Value {
    json!({
        "mappings": {
            "properties": {
                TEXT_FIELD: { "type": "text" },
                VECTOR_FIELD: { "type": "dense_vector", "dims": dims }
            }
        }
    })
}

pub(crate) fn document_body(text: &str, embedding: &[f32]) -> Value {
    json!({
        TEXT_FIELD: text,
        VECTOR_FIELD: embedding,
    })
}

pub(crate) fn keyword_query(query: &str, size: usize) -> Value {
    json!({
        "query": { "query_string": { "query": query } },
        "_source": false,
        "size": size
    })
}

pub(crate) fn similarity_query(vector: &[f32], k: usize) -> Value {
    json!({
        "query": {
            "script_score": {
                "query": { "match_all": {} },
                "script": {
                    "source": COSINE_SCRIPT,
                    "params": { "query_vector": vector }
                }
            }
        },
        "_source": false,
        "size": k
    })
}

pub(crate) fn scroll_start() -> Value {
    json!({
        "query": { "match_all": {} },
        "_source": false,
        "sort": ["_doc"],
        "size": SCROLL_PAGE_SIZE
    })
}

pub(crate) fn scroll_next(scroll_id: &str) -> Value {
    json!({ "scroll": SCROLL_KEEP_ALIVE, "scroll_id": scroll_id })
}

fn hits(response: &Value) -> Result<&Vec<Value>, IndexError> {
    response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| IndexError::InvalidResponse("missing `hits.hits` in search response".into()))
}

fn hit_id(hit: &Value) -> Result<String, IndexError> {
    hit.get("_id")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| IndexError::InvalidResponse("search hit without `_id`".into()))
}

/// Ids of every hit, in engine order.
pub(crate) fn parse_hit_ids(response: &Value) -> Result<Vec<String>, IndexError> {
    hits(response)?.iter().map(hit_id).collect()
}

/// `{id, score}` pairs of every hit, in engine order.
pub(crate) fn parse_scored_hits(response: &Value) -> Result<Vec<SimilarityHit>, IndexError> {
    hits(response)?
        .iter()
        .map(|hit| {
            let score = hit
                .get("_score")
                .and_then(Value::as_f64)
                .ok_or_else(|| IndexError::InvalidResponse("search hit without `_score`".into()))?;
            Ok(SimilarityHit {
                document_id: hit_id(hit)?,
                score,
            })
        })
        .collect()
}

pub(crate) fn parse_scroll_id(response: &Value) -> Option<String> {
    response
        .get("_scroll_id")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// `_source.text` of a get-by-id response, or `None` when the engine says `found: false`.
pub(crate) fn parse_source_text(response: &Value) -> Result<Option<String>, IndexError> {
    if response.get("found").and_then(Value::as_bool) == Some(false) {
        return Ok(None);
    }
    response
        .pointer("/_source/text")
        .and_then(Value::as_str)
        .map(|text| Some(text.to_owned()))
        .ok_or_else(|| IndexError::InvalidResponse("document has no `text` field".into()))
}
