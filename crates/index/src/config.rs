use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection and layout settings for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// `"elasticsearch"` or `"in_memory"`.
    pub backend: String,
    /// `"http"` or `"https"`.
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Basic-auth user. Empty disables auth.
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Name of the single index holding every document.
    pub index_name: String,
    /// Verify the engine's TLS certificate. Local clusters usually run with a
    /// self-signed certificate, hence the `false` default.
    pub verify_certs: bool,
    /// Make writes visible to search before `index_document` returns.
    pub refresh_on_write: bool,
    /// Number of hits returned by a keyword query.
    pub keyword_result_size: usize,
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: "elasticsearch".into(),
            scheme: "https".into(),
            host: "localhost".into(),
            port: 9200,
            username: String::new(),
            password: String::new(),
            index_name: "documents".into(),
            verify_certs: false,
            refresh_on_write: true,
            keyword_result_size: 10,
            request_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: "in_memory".into(),
            ..Default::default()
        }
    }

    /// Base URL of the engine, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.backend.as_str() {
            "elasticsearch" => {
                if !matches!(self.scheme.as_str(), "http" | "https") {
                    return Err(format!(
                        "engine.scheme must be \"http\" or \"https\", got {:?}",
                        self.scheme
                    ));
                }
                if self.host.trim().is_empty() {
                    return Err("engine.host must not be empty".into());
                }
                if self.username.is_empty() != self.password.is_empty() {
                    return Err("engine.username and engine.password must be set together".into());
                }
            }
            "in_memory" => {}
            other => {
                return Err(format!(
                    "engine.backend must be one of [\"elasticsearch\", \"in_memory\"], got {other:?}"
                ))
            }
        }
        if self.index_name.trim().is_empty() {
            return Err("engine.index_name must not be empty".into());
        }
        if self.keyword_result_size == 0 {
            return Err("engine.keyword_result_size must be >= 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.backend, "elasticsearch");
        assert_eq!(cfg.base_url(), "https://localhost:9200");
        assert_eq!(cfg.index_name, "documents");
        assert!(!cfg.verify_certs);
        assert!(cfg.refresh_on_write);
        assert_eq!(cfg.keyword_result_size, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn credentials_must_come_in_pairs() {
        let cfg = EngineConfig {
            username: "elastic".into(),
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().contains("together"));

        let cfg = EngineConfig {
            username: "elastic".into(),
            password: "changeme".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_scheme() {
        let cfg = EngineConfig {
            scheme: "ftp".into(),
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().contains("scheme"));
    }

    #[test]
    fn rejects_unknown_backend() {
        let cfg = EngineConfig {
            backend: "rocksdb".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_index_name() {
        let cfg = EngineConfig {
            index_name: " ".into(),
            ..EngineConfig::in_memory()
        };
        assert!(cfg.validate().unwrap_err().contains("index_name"));
    }

    #[test]
    fn password_is_never_serialized() {
        let cfg = EngineConfig {
            username: "elastic".into(),
            password: "hunter2".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
