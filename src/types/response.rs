//! Response types for queries, uploads, and streaming

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::document::Document;

/// Source metadata attached to a citation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Originating document ID
    pub document_id: Uuid,
    /// Fragment ID
    pub chunk_id: Uuid,
    /// Fragment position within the document
    pub chunk_index: u32,
    /// Originating document filename
    pub filename: String,
    /// Page number hint (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Section hint (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A cited source fragment returned with an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Excerpt of the fragment text, truncated for display
    pub text: String,
    /// Similarity score (higher is more relevant)
    pub score: f32,
    /// Originating document metadata
    pub metadata: SourceMetadata,
}

/// Response from a RAG query
///
/// Failures during retrieval or generation produce a degraded response
/// (empty answer, `error` set in metadata) rather than an HTTP error, so a
/// client always receives a well-formed reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer (empty when degraded)
    pub answer: String,
    /// Cited sources
    pub sources: Vec<SourceCitation>,
    /// Response metadata; contains an `error` key when degraded
    pub metadata: HashMap<String, serde_json::Value>,
}

impl QueryResponse {
    /// Create a successful response
    pub fn new(
        answer: String,
        sources: Vec<SourceCitation>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            answer,
            sources,
            metadata,
        }
    }

    /// Create a degraded response carrying explicit error metadata
    pub fn degraded(error_type: &str, message: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(
            "error".to_string(),
            serde_json::Value::String(message.into()),
        );
        metadata.insert(
            "error_type".to_string(),
            serde_json::Value::String(error_type.to_string()),
        );
        Self {
            answer: String::new(),
            sources: Vec::new(),
            metadata,
        }
    }

    /// Whether this response carries an error instead of an answer
    pub fn is_degraded(&self) -> bool {
        self.metadata.contains_key("error")
    }

    /// Convert into the fixed streaming event sequence: `answer` then
    /// `sources` on success, a single `error` event on failure.
    pub fn into_stream_events(self) -> Vec<StreamEvent> {
        if let Some(error) = self.metadata.get("error") {
            let message = error.as_str().unwrap_or("query failed").to_string();
            return vec![StreamEvent::Error(message)];
        }
        vec![
            StreamEvent::Answer(self.answer),
            StreamEvent::Sources(self.sources),
        ]
    }
}

/// One event in the streamed query protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Full synthesized answer text
    Answer(String),
    /// Citation list, always after the answer
    Sources(Vec<SourceCitation>),
    /// Replaces both events when the query fails
    Error(String),
}

/// Response from a document upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Assigned document ID
    pub document_id: Uuid,
    /// Original filename
    pub filename: String,
    /// Initial lifecycle status
    pub status: String,
    /// Human-readable message
    pub message: String,
}

/// Response for listing documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    /// Documents in the requested page
    pub documents: Vec<Document>,
    /// Total document count
    pub total: usize,
}

/// Response from enqueuing an ingestion job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResponse {
    /// Queue-assigned job ID
    pub job_id: Uuid,
    /// Target document
    pub document_id: Uuid,
    /// Human-readable message
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation() -> SourceCitation {
        SourceCitation {
            text: "excerpt".to_string(),
            score: 0.9,
            metadata: SourceMetadata {
                document_id: Uuid::new_v4(),
                chunk_id: Uuid::new_v4(),
                chunk_index: 0,
                filename: "notes.txt".to_string(),
                page_number: None,
                section: None,
            },
        }
    }

    #[test]
    fn stream_order_is_answer_then_sources() {
        let response = QueryResponse::new(
            "the answer".to_string(),
            vec![citation()],
            HashMap::new(),
        );
        let events = response.into_stream_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], StreamEvent::Answer(a) if a == "the answer"));
        assert!(matches!(&events[1], StreamEvent::Sources(s) if s.len() == 1));
    }

    #[test]
    fn degraded_response_streams_single_error_event() {
        let response = QueryResponse::degraded("llm_error", "model unreachable");
        assert!(response.is_degraded());
        assert!(response.answer.is_empty());
        let events = response.into_stream_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Error(e) if e == "model unreachable"));
    }

    #[test]
    fn stream_event_wire_format() {
        let event = StreamEvent::Answer("hi".to_string());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "answer");
        assert_eq!(value["content"], "hi");

        let event = StreamEvent::Error("boom".to_string());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "error");
    }
}
