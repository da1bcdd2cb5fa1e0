use docsearch::{
    CompletionConfig, DocsearchConfig, EngineConfig, SearchConfig, SemanticConfig,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted when no embedding or completion key is set.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level or full `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format
    #[serde(default = "default_true")]
    pub log_json: bool,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub embedding: SemanticConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            log_json: default_true(),
            metrics_enabled: default_true(),
            engine: EngineConfig::default(),
            embedding: SemanticConfig::default(),
            completion: CompletionConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `docsearch.{yaml,toml,json}`
    /// file and `DOCSEARCH_*` environment variables, in increasing priority.
    ///
    /// Nested keys use `__`, e.g. `DOCSEARCH_ENGINE__HOST=es.internal`.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::load_with(config::File::with_name("docsearch").required(false))
    }

    /// Same as [`load`](Self::load) but reading a specific, required file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::load_with(config::File::from(path.as_ref()).required(true))
    }

    fn load_with(
        file: config::File<config::FileSourceFile, config::FileFormat>,
    ) -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("DOCSEARCH")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        config.apply_api_key_fallback(std::env::var(OPENAI_API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Fill empty model API keys from a shared key.
    pub fn apply_api_key_fallback(&mut self, key: Option<String>) {
        let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
            return;
        };
        if self.embedding.api_key.is_empty() {
            self.embedding.api_key = key.clone();
        }
        if self.completion.api_key.is_empty() {
            self.completion.api_key = key;
        }
    }

    /// Fully offline configuration: in-memory engine and stub models.
    pub fn offline(dimensions: usize) -> Self {
        let pipeline = DocsearchConfig::offline(dimensions);
        Self {
            engine: pipeline.engine,
            embedding: pipeline.embedding,
            completion: pipeline.completion,
            search: pipeline.search,
            ..Default::default()
        }
    }

    /// The pipeline sections as a standalone [`DocsearchConfig`].
    pub fn pipeline(&self) -> DocsearchConfig {
        DocsearchConfig {
            engine: self.engine.clone(),
            embedding: self.embedding.clone(),
            completion: self.completion.clone(),
            search: self.search.clone(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be >= 1");
        }
        if self.max_body_size_mb == 0 {
            anyhow::bail!("max_body_size_mb must be >= 1");
        }
        self.socket_addr()?;
        self.pipeline().validate()?;
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
