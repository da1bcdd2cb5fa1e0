use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which completion model writes the summaries, and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    /// `"api"` (remote chat completions) or `"stub"` (deterministic, offline).
    pub mode: String,
    pub model_name: String,
    /// OpenAI-compatible chat completions endpoint.
    pub api_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub api_timeout_secs: u64,
    /// Sampling temperature. Omitted from the request when unset so the
    /// provider default applies.
    pub temperature: Option<f32>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            model_name: "gpt-3.5-turbo".into(),
            api_url: "https://api.openai.com/v1/chat/completions".into(),
            api_key: String::new(),
            api_timeout_secs: 30,
            temperature: None,
        }
    }
}

impl CompletionConfig {
    pub fn stub() -> Self {
        Self {
            mode: "stub".into(),
            model_name: "stub".into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.mode.as_str() {
            "api" => {
                if self.api_key.trim().is_empty() {
                    return Err(
                        "completion.api_key is required when completion.mode is 'api'".into(),
                    );
                }
                if self.api_url.trim().is_empty() {
                    return Err("completion.api_url must not be empty".into());
                }
            }
            "stub" => {}
            other => {
                return Err(format!(
                    "completion.mode must be one of [\"api\", \"stub\"], got {other:?}"
                ))
            }
        }
        if self.model_name.trim().is_empty() {
            return Err("completion.model_name must not be empty".into());
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("completion.temperature must be in [0, 2], got {t}"));
            }
        }
        Ok(())
    }
}
