use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{CompletionConfig, SummaryError, Summarizer};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Single-turn summaries from an OpenAI-compatible `/chat/completions` endpoint.
///
/// Every call sends exactly two messages (system, user) and keeps no history.
#[derive(Debug, Clone)]
pub struct ChatCompletionSummarizer {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model_name: String,
    temperature: Option<f32>,
}

impl ChatCompletionSummarizer {
    pub fn new(cfg: &CompletionConfig) -> Result<Self, SummaryError> {
        cfg.validate().map_err(SummaryError::InvalidConfig)?;

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SummaryError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            model_name: cfg.model_name.clone(),
            temperature: cfg.temperature,
        })
    }

    fn request<'a>(&'a self, system_prompt: &'a str, user_content: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model_name,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature: self.temperature,
        }
    }
}

fn first_message_content(response: ChatResponse) -> Result<String, SummaryError> {
    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| SummaryError::InvalidResponse("response has no choices".into()))?
        .message
        .content
        .ok_or_else(|| SummaryError::InvalidResponse("first choice has no content".into()))
}

#[async_trait]
impl Summarizer for ChatCompletionSummarizer {
    async fn summarize(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, SummaryError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.request(system_prompt, user_content))
            .send()
            .await
            .inspect_err(|e| {
                tracing::warn!(model = %self.model_name, error = %e, "completion request failed");
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.model_name, status = status.as_u16(), "completion API error");
            return Err(SummaryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| SummaryError::InvalidResponse(format!("invalid JSON response: {e}")))?;
        let content = first_message_content(parsed)?;
        tracing::debug!(model = %self.model_name, chars = content.len(), "summary generated");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summarizer(temperature: Option<f32>) -> ChatCompletionSummarizer {
        ChatCompletionSummarizer::new(&CompletionConfig {
            api_key: "sk-test".into(),
            temperature,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn request_has_system_then_user() {
        let s = summarizer(None);
        let body = serde_json::to_value(s.request("be nice", r#"["a","b"]"#)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "be nice" },
                    { "role": "user", "content": "[\"a\",\"b\"]" }
                ]
            })
        );
    }

    #[test]
    fn request_carries_temperature_when_set() {
        let s = summarizer(Some(0.2));
        let body = serde_json::to_value(s.request("sys", "user")).unwrap();
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn parses_first_choice() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Hello there!" } },
                { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
            ]
        }))
        .unwrap();
        assert_eq!(first_message_content(response).unwrap(), "Hello there!");
    }

    #[test]
    fn empty_choices_is_invalid() {
        let response: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(
            first_message_content(response),
            Err(SummaryError::InvalidResponse(_))
        ));
    }

    #[test]
    fn new_requires_key() {
        assert!(matches!(
            ChatCompletionSummarizer::new(&CompletionConfig::default()),
            Err(SummaryError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        let s = ChatCompletionSummarizer::new(&CompletionConfig {
            api_key: "sk-test".into(),
            api_url: "http://127.0.0.1:9/v1/chat/completions".into(),
            api_timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        let err = s.summarize("sys", "[]").await.unwrap_err();
        assert!(matches!(err, SummaryError::Http(_)));
    }
}
