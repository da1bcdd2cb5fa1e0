//! API route handlers
//!
//! - `documents`: store, list and fetch documents
//! - `search`: keyword and similarity search
//! - `health`: liveness, readiness and metrics

pub mod documents;
pub mod health;
pub mod search;

use crate::error::ServerError;

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound("Not found".to_string())
}

/// 405 handler for known paths hit with the wrong method
pub async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}
