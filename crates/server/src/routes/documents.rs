use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Form body of `POST /`
#[derive(Debug, Deserialize)]
pub struct StoreDocumentForm {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreDocumentResponse {
    pub document_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub document_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub text: String,
}

/// Store a document and its embedding under a fresh id
pub async fn store_document(
    State(state): State<Arc<ServerState>>,
    form: Result<Form<StoreDocumentForm>, FormRejection>,
) -> ServerResult<impl IntoResponse> {
    let Form(form) = form
        .map_err(|r| ServerError::from_form_rejection(r, state.config.max_body_size_mb))?;

    let document_id = state.service.store(form.text.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(StoreDocumentResponse { document_id }),
    ))
}

/// List every stored document id
pub async fn list_documents(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let document_ids = state.service.list_document_ids().await?;
    Ok(Json(DocumentListResponse { document_ids }))
}

/// Get a document's text by id
pub async fn get_document(
    State(state): State<Arc<ServerState>>,
    Path(document_id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let text = state.service.get_document_text(&document_id).await?;
    Ok(Json(DocumentResponse { text }))
}
