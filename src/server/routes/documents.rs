//! Upload and document management endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::storage::sha256_hex;
use crate::types::document::Document;
use crate::types::response::{DocumentListResponse, UploadResponse};

/// Owner recorded on uploads until real authentication is wired in
const DEFAULT_USER: &str = "default_user";

/// POST /v1/upload - Upload a document and enqueue it for ingestion
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut filename = None;
    let mut content_type = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            content_type = field.content_type().map(str::to_string);
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| Error::validation(format!("Failed to read upload: {}", e)))?,
            );
        }
    }

    let data = data.ok_or_else(|| Error::validation("No file provided"))?;
    let filename = filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| Error::validation("No filename provided"))?;

    let limit_mb = state.config().server.max_upload_size_mb;
    if data.len() > state.config().server.max_upload_size() {
        return Err(Error::UploadTooLarge { limit_mb });
    }

    let content_type = content_type.unwrap_or_else(|| {
        mime_guess::from_path(&filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string()
    });

    let document_id = Uuid::new_v4();
    let storage_uri = state
        .file_store()
        .store(document_id, &filename, &data)
        .await?;

    let mut document = Document::new(
        document_id,
        DEFAULT_USER,
        &filename,
        &content_type,
        &storage_uri,
    );
    document.checksum = Some(sha256_hex(&data));

    state.registry().create(&document).await?;
    state.job_queue().enqueue(document_id).await?;

    tracing::info!(
        "Uploaded document {} ({}, {} bytes, {})",
        document_id,
        filename,
        data.len(),
        content_type
    );

    Ok(Json(UploadResponse {
        document_id,
        filename,
        status: document.status.to_string(),
        message: "Document uploaded successfully. Processing started.".to_string(),
    }))
}

/// Pagination parameters for listing documents
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// GET /v1/documents - List documents with pagination
pub async fn list_documents(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<DocumentListResponse>> {
    let (documents, total) = state
        .registry()
        .list(pagination.skip, pagination.limit)
        .await?;

    Ok(Json(DocumentListResponse { documents, total }))
}

/// GET /v1/documents/:id - Get a specific document
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>> {
    let document = state
        .registry()
        .get(id)
        .await?
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

    Ok(Json(document))
}

/// DELETE /v1/documents/:id - Delete a document and its fragments
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let document = state.registry().get(id).await?;

    if !state.registry().delete_document(id).await? {
        return Err(Error::DocumentNotFound(id.to_string()));
    }

    // Best-effort cleanup of the stored upload
    if let Some(document) = document {
        if let Err(e) = state.file_store().delete(&document.storage_uri).await {
            tracing::warn!("Failed to remove stored upload for {}: {}", id, e);
        }
    }

    Ok(Json(serde_json::json!({
        "message": "Document deleted successfully",
        "document_id": id,
    })))
}
