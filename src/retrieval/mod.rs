//! Similarity retrieval over the fragments collection

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::EmbeddingProvider;
use crate::store::{match_fields, VectorStoreGateway, FRAGMENTS_COLLECTION};
use crate::types::Chunk;

/// A fragment returned from similarity search, with its score
#[derive(Debug, Clone)]
pub struct RetrievedFragment {
    /// The matched fragment
    pub chunk: Chunk,
    /// Similarity score (higher is more relevant)
    pub score: f32,
}

/// Embeds a query and runs similarity search against the fragments
/// collection
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    gateway: Arc<VectorStoreGateway>,
}

impl Retriever {
    /// Create a retriever over the given embedder and gateway
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, gateway: Arc<VectorStoreGateway>) -> Self {
        Self { embedder, gateway }
    }

    /// Retrieve the top-k fragments most similar to the query text,
    /// optionally restricted by payload filters
    pub async fn retrieve(
        &self,
        query: &str,
        filters: Option<&HashMap<String, serde_json::Value>>,
        top_k: usize,
    ) -> Result<Vec<RetrievedFragment>> {
        let vector = self.embedder.embed(query).await?;
        let filter = filters.and_then(match_fields);

        let points = self
            .gateway
            .similarity_search(FRAGMENTS_COLLECTION, &vector, top_k, filter)
            .await?;

        let mut fragments = Vec::with_capacity(points.len());
        for point in points {
            match serde_json::from_value::<Chunk>(point.payload) {
                Ok(chunk) => fragments.push(RetrievedFragment {
                    chunk,
                    score: point.score,
                }),
                Err(e) => tracing::warn!("Skipping malformed fragment payload: {}", e),
            }
        }

        Ok(fragments)
    }
}
