//! Document and fragment types with lifecycle tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a document
///
/// Transitions: `uploaded -> processing -> ingested | failed`. A `failed`
/// (or already `ingested`) document returns to `processing` only through an
/// explicit re-ingestion trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Ingested,
    Failed,
}

impl DocumentStatus {
    /// Whether a transition from `self` to `next` is legal.
    ///
    /// `Failed -> Processing` and `Ingested -> Processing` are the explicit
    /// re-ingestion edges; `Processing -> Processing` is rejected so a
    /// duplicate job delivery cannot claim a document that another worker
    /// already owns.
    pub fn can_transition(self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        matches!(
            (self, next),
            (Uploaded, Processing)
                | (Processing, Ingested)
                | (Processing, Failed)
                | (Failed, Processing)
                | (Ingested, Processing)
        )
    }

}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Ingested => "ingested",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A document record, persisted as the payload of a point in the
/// `documents` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub document_id: Uuid,
    /// Owner of the document
    pub user_id: String,
    /// Original filename as uploaded
    pub filename: String,
    /// Declared media type
    pub content_type: String,
    /// Where the raw upload is stored
    pub storage_uri: String,
    /// Lifecycle status
    pub status: DocumentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Optional tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// SHA-256 checksum of the uploaded content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Error description retained when ingestion fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Document {
    /// Create a new document record in the `uploaded` state
    pub fn new(
        document_id: Uuid,
        user_id: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        storage_uri: impl Into<String>,
    ) -> Self {
        Self {
            document_id,
            user_id: user_id.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            storage_uri: storage_uri.into(),
            status: DocumentStatus::Uploaded,
            created_at: Utc::now(),
            updated_at: None,
            tags: None,
            checksum: None,
            error: None,
        }
    }
}

/// A fragment of a document's extracted text, persisted as the payload of a
/// point in the `fragments` collection (the embedding vector travels
/// alongside, not inside, the payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub chunk_id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Owner of the parent document
    pub user_id: String,
    /// Text content
    pub text: String,
    /// Zero-based position within the document
    pub chunk_index: u32,
    /// Page number hint (1-indexed, if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Section or heading hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Optional tags inherited from the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Language hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Embedding model version the vector was produced with
    pub embedding_version: String,
}

impl Chunk {
    /// Create a new chunk for a document
    pub fn new(
        document: &Document,
        text: String,
        chunk_index: u32,
        embedding_version: impl Into<String>,
    ) -> Self {
        Self {
            chunk_id: Uuid::new_v4(),
            document_id: document.document_id,
            user_id: document.user_id.clone(),
            text,
            chunk_index,
            page_number: None,
            section: None,
            tags: document.tags.clone(),
            language: None,
            embedding_version: embedding_version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_to_lowercase() {
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Uploaded).unwrap(),
            "\"uploaded\""
        );
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Ingested).unwrap(),
            "\"ingested\""
        );
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn legal_transitions() {
        use DocumentStatus::*;
        assert!(Uploaded.can_transition(Processing));
        assert!(Processing.can_transition(Ingested));
        assert!(Processing.can_transition(Failed));
        // Explicit re-ingestion edges
        assert!(Failed.can_transition(Processing));
        assert!(Ingested.can_transition(Processing));
    }

    #[test]
    fn illegal_transitions() {
        use DocumentStatus::*;
        assert!(!Uploaded.can_transition(Ingested));
        assert!(!Uploaded.can_transition(Failed));
        assert!(!Failed.can_transition(Ingested));
        assert!(!Ingested.can_transition(Failed));
        // A duplicate delivery cannot claim a document mid-flight
        assert!(!Processing.can_transition(Processing));
    }

    #[test]
    fn chunk_inherits_document_fields() {
        let doc = Document::new(
            Uuid::new_v4(),
            "default_user",
            "notes.txt",
            "text/plain",
            "./uploads/x_notes.txt",
        );
        let chunk = Chunk::new(&doc, "hello".to_string(), 0, "v1");
        assert_eq!(chunk.document_id, doc.document_id);
        assert_eq!(chunk.user_id, doc.user_id);
        assert_eq!(chunk.chunk_index, 0);
        assert_eq!(chunk.embedding_version, "v1");
    }

    #[test]
    fn document_payload_shape_round_trips() {
        let doc = Document::new(
            Uuid::new_v4(),
            "default_user",
            "report.pdf",
            "application/pdf",
            "./uploads/a_report.pdf",
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["status"], "uploaded");
        assert!(value.get("updated_at").is_none());
        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back.document_id, doc.document_id);
        assert_eq!(back.status, DocumentStatus::Uploaded);
    }
}
