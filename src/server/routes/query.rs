//! Query endpoints: RAG answers, streaming, and direct chat

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;

use crate::server::state::AppState;
use crate::types::query::QueryRequest;
use crate::types::response::QueryResponse;

/// POST /v1/query - Answer a question over the indexed documents
pub async fn query_documents(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    Json(run_query(&state, request).await)
}

/// Run the retrieve-then-synthesize flow, converting every failure into a
/// degraded response so the client always receives a well-formed reply
async fn run_query(state: &AppState, request: QueryRequest) -> QueryResponse {
    tracing::info!("Query: \"{}\"", request.query);

    let fragments = match state
        .retriever()
        .retrieve(&request.query, request.filters.as_ref(), request.top_k)
        .await
    {
        Ok(fragments) => fragments,
        Err(e) => {
            tracing::error!("Retrieval failed: {}", e);
            return QueryResponse::degraded("retrieval_error", e.to_string());
        }
    };

    let documents = match state
        .registry()
        .resolve_documents(fragments.iter().map(|f| f.chunk.document_id))
        .await
    {
        Ok(documents) => documents,
        Err(e) => {
            tracing::error!("Source lookup failed: {}", e);
            return QueryResponse::degraded("retrieval_error", e.to_string());
        }
    };

    state
        .synthesizer()
        .synthesize(&request, fragments, &documents)
        .await
}

/// Query string parameters for the streaming endpoint
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub query: String,
    /// JSON-encoded payload filters
    #[serde(default)]
    pub filters: Option<String>,
}

/// GET /v1/query/stream - Stream the answer as the fixed two-event sequence
/// (`answer`, then `sources`), or a single `error` event on failure
pub async fn query_documents_stream(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let filters: Option<HashMap<String, serde_json::Value>> = match params.filters.as_deref() {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(filters) => Some(filters),
            Err(e) => {
                let response =
                    QueryResponse::degraded("validation_error", format!("Invalid filters: {}", e));
                return sse_from_response(response);
            }
        },
        None => None,
    };

    let mut request = QueryRequest::new(params.query);
    request.filters = filters;

    let response = run_query(&state, request).await;
    sse_from_response(response)
}

fn sse_from_response(
    response: QueryResponse,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let events = response.into_stream_events().into_iter().map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data))
    });
    Sse::new(futures::stream::iter(events))
}

/// POST /v1/chat - Direct generation that bypasses retrieval entirely
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    tracing::info!("Chat request: \"{}\"", request.query);

    let response = match state
        .llm()
        .generate(&request.query, request.temperature)
        .await
    {
        Ok(answer) => {
            let mut metadata = HashMap::new();
            metadata.insert(
                "model".to_string(),
                serde_json::Value::String(state.llm().model().to_string()),
            );
            metadata.insert(
                "type".to_string(),
                serde_json::Value::String("direct_llm".to_string()),
            );
            QueryResponse::new(answer, Vec::new(), metadata)
        }
        Err(e) => {
            tracing::error!("Chat failed: {}", e);
            QueryResponse::degraded("llm_error", e.to_string())
        }
    };

    Json(response)
}
