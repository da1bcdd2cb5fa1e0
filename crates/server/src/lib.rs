//! docsearch Server - HTTP API for storing and searching text documents
//!
//! Documents are embedded by an OpenAI-compatible model and stored in
//! Elasticsearch together with their vectors. Searches go to the engine and the
//! results are handed to a chat model for a readable summary.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /` - Store a document (form field `text`)
//! - `GET /search_keyword?q=` - Keyword search plus summary
//! - `GET /search_similarity?q=&k=` - Vector similarity search plus summary
//! - `GET /documents` - List every document id
//! - `GET /document/{document_id}` - Fetch a document's text
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (search engine reachable)
//! - `GET /metrics` - Prometheus metrics
//!
//! Every error response has the shape `{"error": "<message>"}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
