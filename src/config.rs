//! YAML configuration for the docsearch pipeline.
//!
//! One file describes the search engine connection, the embedding and
//! completion models, and the search defaults. Every section is optional and
//! falls back to its defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! engine:
//!   scheme: "https"
//!   host: "localhost"
//!   port: 9200
//!   username: "elastic"
//!   password: "changeme"
//!   index_name: "documents"
//!   verify_certs: false
//!
//! embedding:
//!   model_name: "text-embedding-3-small"
//!   dimensions: 1536
//!   api_key: "sk-..."
//!
//! completion:
//!   model_name: "gpt-3.5-turbo"
//!   api_key: "sk-..."
//!
//! search:
//!   default_top_k: 3
//! ```

use std::fs;
use std::path::Path;

use index::EngineConfig;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use summarize::CompletionConfig;
use thiserror::Error;

/// System prompt for summarizing keyword search results.
pub const KEYWORD_SEARCH_PROMPT: &str = "\
You are a master of clean data outputs. You will receive a list of text documents that a user has looked up by keyword.
After a friendly introduction, provide a well-organized response that is more human-readable than what is provided.
If the list is empty, inform the user accordingly. Do not output anything after providing the answer.
";

/// System prompt for summarizing similarity search results.
pub const SIMILARITY_SEARCH_PROMPT: &str = "\
You are a master of clean data outputs. You will receive a list of text documents that a user has looked up by vector similarity search.
The data should be outputted in the same order as the list. After a friendly introduction, give a well-organized response that is more human-readable than what is provided.
If the list is empty, inform the user accordingly. Do not output anything after providing the answer.
";

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for the whole service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocsearchConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub embedding: SemanticConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for DocsearchConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            engine: EngineConfig::default(),
            embedding: SemanticConfig::default(),
            completion: CompletionConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl DocsearchConfig {
    /// Fully offline setup: in-memory engine, stub embedder and stub summarizer.
    pub fn offline(dimensions: usize) -> Self {
        Self {
            engine: EngineConfig::in_memory(),
            embedding: SemanticConfig::stub(dimensions),
            completion: CompletionConfig::stub(),
            ..Default::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DocsearchConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section. Run before any client is built so a bad setup
    /// never starts serving.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.engine.validate().map_err(ConfigLoadError::Validation)?;
        self.embedding
            .validate()
            .map_err(ConfigLoadError::Validation)?;
        self.completion
            .validate()
            .map_err(ConfigLoadError::Validation)?;
        self.search.validate()?;
        Ok(())
    }
}

/// Query defaults and the summarizer prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Result count for similarity search when the caller gives no `k`.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Largest accepted `k`. The engine refuses larger result windows.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    #[serde(default)]
    pub prompts: PromptConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            prompts: PromptConfig::default(),
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.default_top_k == 0 {
            return Err(ConfigLoadError::Validation(
                "search.default_top_k must be >= 1".into(),
            ));
        }
        if self.default_top_k > self.max_top_k {
            return Err(ConfigLoadError::Validation(format!(
                "search.default_top_k ({}) must not exceed search.max_top_k ({})",
                self.default_top_k, self.max_top_k
            )));
        }
        self.prompts.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptConfig {
    #[serde(default = "default_keyword_prompt")]
    pub keyword_search: String,

    #[serde(default = "default_similarity_prompt")]
    pub similarity_search: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            keyword_search: default_keyword_prompt(),
            similarity_search: default_similarity_prompt(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.keyword_search.trim().is_empty() || self.similarity_search.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "search.prompts must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
fn default_top_k() -> usize {
    3
}
fn default_max_top_k() -> usize {
    10_000
}
fn default_keyword_prompt() -> String {
    KEYWORD_SEARCH_PROMPT.to_string()
}
fn default_similarity_prompt() -> String {
    SIMILARITY_SEARCH_PROMPT.to_string()
}
