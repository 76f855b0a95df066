//! Ingestion trigger and job lookup endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{IngestionJob, QueueStats};
use crate::server::state::AppState;
use crate::types::response::EnqueueResponse;

/// POST /v1/ingest/:id - Explicitly (re-)enqueue ingestion for a document.
///
/// This is the only path by which a `failed` or already `ingested` document
/// returns to `processing`.
pub async fn trigger_ingestion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EnqueueResponse>> {
    if state.registry().get(id).await?.is_none() {
        return Err(Error::DocumentNotFound(id.to_string()));
    }

    let job = state.job_queue().enqueue(id).await?;

    Ok(Json(EnqueueResponse {
        job_id: job.job_id,
        document_id: id,
        message: "Ingestion job enqueued".to_string(),
    }))
}

/// GET /v1/jobs - Queue statistics
pub async fn list_jobs(State(state): State<AppState>) -> Json<QueueStats> {
    Json(state.job_queue().stats())
}

/// GET /v1/jobs/:id - Inspect an ingestion job's delivery record
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IngestionJob>> {
    state
        .job_queue()
        .get(id)
        .map(Json)
        .ok_or_else(|| Error::JobNotFound(id.to_string()))
}
