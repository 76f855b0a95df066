//! Ingestion pipeline: parse, chunk, embed, index

pub mod chunker;
pub mod parser;

pub use chunker::{ChunkSpan, TextChunker};
pub use parser::{ContentParser, ParserKind};

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{Error, ParseErrorKind, Result};
use crate::providers::EmbeddingProvider;
use crate::registry::DocumentRegistry;
use crate::types::{Chunk, Document};

/// Drives a single document through parse -> chunk -> embed -> upsert.
///
/// No transaction spans the stages; a crash mid-ingestion can leave partial
/// fragments behind, which is why fragment replacement always deletes the
/// document's existing fragments first.
pub struct IngestionPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    registry: Arc<DocumentRegistry>,
    batch_size: usize,
    embedding_version: String,
}

impl IngestionPipeline {
    /// Assemble the pipeline from configuration and collaborators
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        registry: Arc<DocumentRegistry>,
    ) -> Self {
        Self {
            chunker: TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap),
            embedder,
            registry,
            batch_size: config.embedding.batch_size.max(1),
            embedding_version: config.embedding.version.clone(),
        }
    }

    /// Ingest a document, returning the number of fragments indexed
    pub async fn ingest(&self, document: &Document) -> Result<usize> {
        let data = tokio::fs::read(&document.storage_uri).await.map_err(|e| {
            Error::parse(
                ParseErrorKind::IoFailure,
                format!("Failed to read '{}': {}", document.storage_uri, e),
            )
        })?;

        let text = ContentParser::parse(&data, &document.content_type)?;

        let spans = self.chunker.chunk(&text);
        if spans.is_empty() {
            return Err(Error::parse(
                ParseErrorKind::DecodeFailure,
                "Document contains no indexable text",
            ));
        }

        let chunks: Vec<Chunk> = spans
            .into_iter()
            .enumerate()
            .map(|(index, span)| {
                Chunk::new(
                    document,
                    span.text,
                    index as u32,
                    self.embedding_version.as_str(),
                )
            })
            .collect();

        tracing::info!(
            "Embedding {} fragments for document {} ({})",
            chunks.len(),
            document.document_id,
            document.filename
        );

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            vectors.extend(self.embedder.embed_batch(&texts).await?);
        }

        self.registry
            .replace_fragments(document.document_id, &chunks, vectors)
            .await
    }
}
