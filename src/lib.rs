//! rag-assistant: document Q&A service with async ingestion and cited
//! answers
//!
//! Uploaded documents are parsed, chunked, embedded, and indexed into an
//! external vector database by a background worker pool; natural-language
//! queries retrieve the most similar fragments and feed them to a language
//! model, returning an answer with source citations. Both the embedding and
//! LLM backends are pluggable (OpenAI-compatible or Ollama), selected once
//! at startup.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod registry;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Document, DocumentStatus},
    query::QueryRequest,
    response::{QueryResponse, SourceCitation, StreamEvent},
};
