//! API routes

pub mod documents;
pub mod ingest;
pub mod query;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Upload - with larger body limit for multipart
        .route(
            "/upload",
            post(documents::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Document management
        .route("/documents", get(documents::list_documents))
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id", delete(documents::delete_document))
        // Query
        .route("/query", post(query::query_documents))
        .route("/query/stream", get(query::query_documents_stream))
        .route("/chat", post(query::chat))
        // Ingestion trigger and job inspection
        .route("/ingest/:id", post(ingest::trigger_ingestion))
        .route("/jobs", get(ingest::list_jobs))
        .route("/jobs/:id", get(ingest::get_job))
}

/// GET /v1/health - Probe the upstream services
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let vector_db = state.gateway().health_check().await.unwrap_or(false);
    let embedding = state.embedder().health_check().await.unwrap_or(false);
    let llm = state.llm().health_check().await.unwrap_or(false);

    let healthy = vector_db && embedding && llm;
    let body = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "vector_db": if vector_db { "connected" } else { "unreachable" },
        "embedding": if embedding { "connected" } else { "unreachable" },
        "llm": if llm { "connected" } else { "unreachable" },
        "queue_depth": state.job_queue().depth(),
    });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}
