//! docsearch summarization client
//!
//! Hands a search result list to a chat model together with a system prompt
//! and returns whatever prose comes back. The output is advisory: callers keep
//! the raw results next to it and never parse the summary.
//!
//! ```
//! use summarize::{build_summarizer, CompletionConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let summarizer = build_summarizer(&CompletionConfig::stub()).unwrap();
//! let text = summarizer.summarize("Be friendly.", "[]").await.unwrap();
//! assert!(text.contains("No documents"));
//! # }
//! ```

pub mod config;
pub mod error;

mod chat;
mod stub;

pub use crate::chat::ChatCompletionSummarizer;
pub use crate::config::CompletionConfig;
pub use crate::error::SummaryError;
pub use crate::stub::StubSummarizer;

use async_trait::async_trait;
use std::sync::Arc;

/// (system prompt, user content) to text. Stateless between calls.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, SummaryError>;

    fn model_name(&self) -> &str;
}

pub fn build_summarizer(cfg: &CompletionConfig) -> Result<Arc<dyn Summarizer>, SummaryError> {
    cfg.validate().map_err(SummaryError::InvalidConfig)?;
    match cfg.mode.as_str() {
        "api" => Ok(Arc::new(ChatCompletionSummarizer::new(cfg)?)),
        "stub" => Ok(Arc::new(StubSummarizer::new())),
        other => Err(SummaryError::InvalidConfig(format!(
            "unknown completion mode {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_stub() {
        let s = build_summarizer(&CompletionConfig::stub()).unwrap();
        assert_eq!(s.model_name(), "stub");
    }

    #[test]
    fn build_api_with_key() {
        let cfg = CompletionConfig {
            api_key: "sk-test".into(),
            ..Default::default()
        };
        let s = build_summarizer(&cfg).unwrap();
        assert_eq!(s.model_name(), "gpt-3.5-turbo");
    }

    #[test]
    fn build_api_without_key_fails() {
        let err = build_summarizer(&CompletionConfig::default()).err().unwrap();
        assert!(matches!(err, SummaryError::InvalidConfig(_)));
    }
}
