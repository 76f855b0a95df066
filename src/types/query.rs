//! Query request types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query request for RAG search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub query: String,

    /// Optional payload filters applied to the fragments collection
    /// (e.g. `{"document_id": "..."}`)
    #[serde(default)]
    pub filters: Option<HashMap<String, serde_json::Value>>,

    /// Number of fragments to retrieve
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Temperature for answer generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_top_k() -> usize {
    5
}

fn default_temperature() -> f32 {
    0.7
}

impl QueryRequest {
    /// Create a new query with defaults
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: None,
            top_k: default_top_k(),
            temperature: default_temperature(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"query": "what is the deadline?"}"#).unwrap();
        assert_eq!(request.top_k, 5);
        assert_eq!(request.temperature, 0.7);
        assert!(request.filters.is_none());
    }
}
