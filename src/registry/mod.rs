//! Document registry: CRUD over document records and the lifecycle state
//! machine
//!
//! The registry is the only component that writes document or fragment
//! records. Documents live in the `documents` collection keyed by their own
//! id, so an upsert is the whole read-modify-write and there is exactly one
//! record per document. Status transitions are guarded by the legal
//! transition matrix, and a per-document lease serializes workers (and
//! deletes) that target the same document.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::Result;
use crate::store::{
    match_field, PointRecord, VectorStoreGateway, DOCUMENTS_COLLECTION, DOCUMENT_DUMMY_VECTOR,
    FRAGMENTS_COLLECTION,
};
use crate::types::{Chunk, Document, DocumentStatus};

/// Registry over the documents and fragments collections
pub struct DocumentRegistry {
    gateway: Arc<VectorStoreGateway>,
    leases: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl DocumentRegistry {
    /// Create a registry over the given gateway
    pub fn new(gateway: Arc<VectorStoreGateway>) -> Self {
        Self {
            gateway,
            leases: DashMap::new(),
        }
    }

    /// Acquire the lease for a document.
    ///
    /// Held by a worker for the span of an ingestion job and by deletes, so
    /// concurrent operations on one document serialize instead of racing the
    /// read-modify-write status update.
    pub async fn lease(&self, document_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .leases
            .entry(document_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    async fn write(&self, document: &Document) -> Result<()> {
        let point = PointRecord {
            id: document.document_id.to_string(),
            vector: DOCUMENT_DUMMY_VECTOR.to_vec(),
            payload: serde_json::to_value(document)?,
        };
        self.gateway.upsert(DOCUMENTS_COLLECTION, vec![point]).await
    }

    /// Create a new document record
    pub async fn create(&self, document: &Document) -> Result<()> {
        self.write(document).await
    }

    /// Fetch a document by id
    pub async fn get(&self, document_id: Uuid) -> Result<Option<Document>> {
        let points = self
            .gateway
            .query_by_filter(
                DOCUMENTS_COLLECTION,
                Some(match_field("document_id", document_id.to_string())),
                1,
                0,
            )
            .await?;

        match points.into_iter().next() {
            Some(point) => Ok(Some(serde_json::from_value(point.payload)?)),
            None => Ok(None),
        }
    }

    /// List documents with pagination, returning the page and the total
    /// count
    pub async fn list(&self, skip: usize, limit: usize) -> Result<(Vec<Document>, usize)> {
        let points = self
            .gateway
            .query_by_filter(DOCUMENTS_COLLECTION, None, limit, skip)
            .await?;

        let mut documents = Vec::with_capacity(points.len());
        for point in points {
            match serde_json::from_value::<Document>(point.payload) {
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::warn!("Skipping malformed document record: {}", e),
            }
        }
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let total = self.gateway.count(DOCUMENTS_COLLECTION, None).await?;
        Ok((documents, total))
    }

    /// Update a document's lifecycle status.
    ///
    /// Returns false without writing when the document is absent or the
    /// transition is not legal from the current state. `error` replaces the
    /// stored error description (cleared on success transitions).
    pub async fn update_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        error: Option<String>,
    ) -> Result<bool> {
        let Some(mut document) = self.get(document_id).await? else {
            return Ok(false);
        };

        if !document.status.can_transition(status) {
            tracing::warn!(
                "Rejected status transition {} -> {} for document {}",
                document.status,
                status,
                document_id
            );
            return Ok(false);
        }

        document.status = status;
        document.error = error;
        document.updated_at = Some(chrono::Utc::now());
        self.write(&document).await?;
        Ok(true)
    }

    /// Delete a document and all of its fragments.
    ///
    /// Fragments are removed first so a failure cannot orphan them behind a
    /// missing document record. Returns false when the document does not
    /// exist.
    pub async fn delete_document(&self, document_id: Uuid) -> Result<bool> {
        let lease = self.lease(document_id).await;

        if self.get(document_id).await?.is_none() {
            return Ok(false);
        }

        let fragments = self.fragment_count(document_id).await?;
        self.delete_fragments(document_id).await?;
        self.gateway
            .delete_by_filter(
                DOCUMENTS_COLLECTION,
                match_field("document_id", document_id.to_string()),
            )
            .await?;

        drop(lease);
        self.leases.remove(&document_id);

        tracing::info!("Deleted document {} and {} fragments", document_id, fragments);
        Ok(true)
    }

    /// Delete every fragment belonging to a document
    pub async fn delete_fragments(&self, document_id: Uuid) -> Result<()> {
        self.gateway
            .delete_by_filter(
                FRAGMENTS_COLLECTION,
                match_field("document_id", document_id.to_string()),
            )
            .await
    }

    /// Replace a document's fragments with a freshly embedded set.
    ///
    /// Existing fragments are deleted first, which makes re-ingestion
    /// idempotent even after a crash left partial fragments behind.
    pub async fn replace_fragments(
        &self,
        document_id: Uuid,
        chunks: &[Chunk],
        vectors: Vec<Vec<f32>>,
    ) -> Result<usize> {
        if chunks.len() != vectors.len() {
            return Err(crate::error::Error::embedding(format!(
                "Embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        self.delete_fragments(document_id).await?;

        let mut points = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.iter().zip(vectors) {
            points.push(PointRecord {
                id: chunk.chunk_id.to_string(),
                vector,
                payload: serde_json::to_value(chunk)?,
            });
        }
        self.gateway.upsert(FRAGMENTS_COLLECTION, points).await?;
        Ok(chunks.len())
    }

    /// Count fragments belonging to a document
    pub async fn fragment_count(&self, document_id: Uuid) -> Result<usize> {
        self.gateway
            .count(
                FRAGMENTS_COLLECTION,
                Some(match_field("document_id", document_id.to_string())),
            )
            .await
    }

    /// Resolve document records for a set of ids, skipping any that are
    /// missing
    pub async fn resolve_documents(
        &self,
        ids: impl Iterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, Document>> {
        let mut documents = HashMap::new();
        for id in ids {
            if documents.contains_key(&id) {
                continue;
            }
            if let Some(doc) = self.get(id).await? {
                documents.insert(id, doc);
            }
        }
        Ok(documents)
    }
}
