use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docsearch::PipelineError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Every failure a handler can return. The one place errors become status codes.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The caller's input is missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The document does not exist. Carries the engine's own message.
    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Payload too large: max {0}MB allowed")]
    PayloadTooLarge(usize),

    /// The embedding service, search engine or completion service failed.
    #[error("{0}")]
    Upstream(PipelineError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Upstream(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-readable code, used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound(_) => "NOT_FOUND",
            ServerError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::Upstream(PipelineError::Embedding(_)) => "EMBEDDING_ERROR",
            ServerError::Upstream(PipelineError::Index(_)) => "ENGINE_ERROR",
            ServerError::Upstream(PipelineError::Summary(_)) => "COMPLETION_ERROR",
            ServerError::Upstream(_) => "PIPELINE_ERROR",
            ServerError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Map a form body rejection. A body that is not a form at all is treated
    /// the same as a form without `text`.
    pub fn from_form_rejection(rejection: FormRejection, max_body_mb: usize) -> Self {
        match rejection {
            FormRejection::InvalidFormContentType(_) => {
                ServerError::BadRequest(PipelineError::MissingText.to_string())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ServerError::PayloadTooLarge(max_body_mb)
            }
            other => ServerError::BadRequest(other.body_text()),
        }
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        if err.is_invalid_input() {
            ServerError::BadRequest(err.to_string())
        } else if err.is_not_found() {
            ServerError::NotFound(err.to_string())
        } else if let PipelineError::Config(msg) = err {
            ServerError::Config(msg)
        } else {
            ServerError::Upstream(err)
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}
