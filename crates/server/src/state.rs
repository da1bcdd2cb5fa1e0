use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use docsearch::DocumentService;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Name of the per-request counter.
pub const REQUESTS_TOTAL: &str = "docsearch_requests_total";
/// Name of the per-request latency histogram.
pub const REQUEST_DURATION_SECONDS: &str = "docsearch_request_duration_seconds";

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// The Prometheus recorder is process-global, so it is installed at most once.
static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

fn prometheus_handle() -> ServerResult<PrometheusHandle> {
    PROMETHEUS
        .get_or_try_init(|| {
            PrometheusBuilder::new()
                .set_buckets_for_metric(
                    Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                    LATENCY_BUCKETS,
                )
                .map_err(|e| ServerError::Config(format!("metrics buckets: {e}")))?
                .install_recorder()
                .map_err(|e| ServerError::Config(format!("metrics recorder: {e}")))
        })
        .cloned()
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Document pipeline (shared across requests)
    pub service: Arc<DocumentService>,

    /// Renders `/metrics`. `None` when metrics are disabled.
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Build every client from `config`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let service = DocumentService::from_config(&config.pipeline())?;
        Self::with_service(config, service)
    }

    /// Use an already constructed pipeline, e.g. one with substituted clients.
    pub fn with_service(config: ServerConfig, service: DocumentService) -> ServerResult<Self> {
        let metrics = if config.metrics_enabled {
            Some(prometheus_handle()?)
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            service: Arc::new(service),
            metrics,
        })
    }
}
