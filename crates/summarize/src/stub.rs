use async_trait::async_trait;

use crate::{SummaryError, Summarizer};

/// Offline summarizer that echoes its input behind a fixed greeting.
#[derive(Debug, Clone, Default)]
pub struct StubSummarizer;

impl StubSummarizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(
        &self,
        _system_prompt: &str,
        user_content: &str,
    ) -> Result<String, SummaryError> {
        let content = user_content.trim();
        if content.is_empty() || content == "[]" {
            return Ok("Hello! No documents matched your search.".into());
        }
        Ok(format!("Hello! Here are the matching documents: {content}"))
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}
