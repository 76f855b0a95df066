//! Core data types: documents, fragments, queries, responses

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, DocumentStatus};
pub use query::QueryRequest;
pub use response::{QueryResponse, SourceCitation, StreamEvent};
