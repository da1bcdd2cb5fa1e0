use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::normalize::prepare_text;
use crate::{Embedder, SemanticConfig, SemanticError};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// The inner `reqwest::Client` pools connections and is safe to share across
/// tasks, so one instance serves every request of the process.
#[derive(Debug, Clone)]
pub struct ApiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model_name: String,
    dimensions: usize,
}

impl ApiEmbedder {
    pub fn new(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        cfg.validate().map_err(SemanticError::InvalidConfig)?;

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            model_name: cfg.model_name.clone(),
            dimensions: cfg.dimensions,
        })
    }

    async fn send(&self, payload: Value) -> Result<Value, SemanticError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::InvalidResponse(format!("invalid JSON response: {e}")))
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let payload = build_payload(&self.model_name, &prepare_text(text));
        let response = self.send(payload).await.inspect_err(|e| {
            tracing::warn!(model = %self.model_name, error = %e, "embedding request failed");
        })?;

        let vector = parse_first_embedding(response)?;
        if vector.len() != self.dimensions {
            return Err(SemanticError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        tracing::debug!(model = %self.model_name, dims = vector.len(), "embedding generated");
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn build_payload(model_name: &str, text: &str) -> Value {
    json!({ "input": [text], "model": model_name })
}

/// Pull `data[0].embedding` out of an OpenAI-style response.
fn parse_first_embedding(value: Value) -> Result<Vec<f32>, SemanticError> {
    let Value::Object(mut map) = value else {
        return Err(SemanticError::InvalidResponse(
            "response body is not a JSON object".into(),
        ));
    };

    let Some(Value::Array(items)) = map.remove("data") else {
        return Err(SemanticError::InvalidResponse(
            "missing `data` array in response".into(),
        ));
    };

    match items.into_iter().next() {
        Some(Value::Object(mut item)) => match item.remove("embedding") {
            Some(embedding) => parse_embedding_vector(embedding),
            None => Err(SemanticError::InvalidResponse(
                "missing `embedding` field in data item".into(),
            )),
        },
        Some(_) => Err(SemanticError::InvalidResponse(
            "unexpected entry inside `data` array".into(),
        )),
        None => Err(SemanticError::InvalidResponse(
            "API response did not contain embeddings".into(),
        )),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num.as_f64().map(|f| f as f32).ok_or_else(|| {
                    SemanticError::InvalidResponse("non-finite embedding value".into())
                }),
                other => Err(SemanticError::InvalidResponse(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::InvalidResponse(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
