//! Typed gateway over the external vector database
//!
//! Wraps two logical collections behind one client: `documents` holds
//! metadata-only records under a degenerate one-dimensional vector and is
//! only ever scanned by filter; `fragments` holds real embeddings and is the
//! only target of similarity search. Collections are created lazily at
//! startup, parameterized by the active embedding dimension.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};

/// Collection holding document metadata records
pub const DOCUMENTS_COLLECTION: &str = "documents";
/// Collection holding fragment embeddings
pub const FRAGMENTS_COLLECTION: &str = "fragments";

/// Constant vector stored with every document record; the documents
/// collection is never subject to similarity search
pub const DOCUMENT_DUMMY_VECTOR: [f32; 1] = [0.0];

/// A point to upsert: id, vector, and JSON payload
#[derive(Debug, Clone)]
pub struct PointRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: serde_json::Value,
}

/// A point returned from a filtered scan
#[derive(Debug, Clone, Deserialize)]
pub struct StoredPoint {
    pub id: serde_json::Value,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A point returned from similarity search, with its score
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    pub id: serde_json::Value,
    pub score: f32,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Build a filter matching a single payload field
pub fn match_field(key: &str, value: impl Into<serde_json::Value>) -> serde_json::Value {
    json!({
        "must": [
            { "key": key, "match": { "value": value.into() } }
        ]
    })
}

/// Build a filter from a map of payload fields (all must match)
pub fn match_fields(
    fields: &std::collections::HashMap<String, serde_json::Value>,
) -> Option<serde_json::Value> {
    if fields.is_empty() {
        return None;
    }
    let conditions: Vec<serde_json::Value> = fields
        .iter()
        .map(|(key, value)| json!({ "key": key, "match": { "value": value } }))
        .collect();
    Some(json!({ "must": conditions }))
}

#[derive(Deserialize)]
struct ScrollEnvelope {
    result: ScrollResult,
}

#[derive(Deserialize)]
struct ScrollResult {
    points: Vec<StoredPoint>,
}

#[derive(Deserialize)]
struct SearchEnvelope {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct CountEnvelope {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

/// Client for the vector database's HTTP API
pub struct VectorStoreGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    dimension: usize,
    ensured: tokio::sync::OnceCell<()>,
}

impl VectorStoreGateway {
    /// Create a gateway for the configured vector database.
    ///
    /// `dimension` is the active embedding dimension and fixes the schema of
    /// the fragments collection for the lifetime of the deployment.
    pub fn new(config: &VectorDbConfig, dimension: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            dimension,
            ensured: tokio::sync::OnceCell::new(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::vector_store(format!(
            "{} failed: HTTP {} - {}",
            action, status, body
        )))
    }

    /// Check that the vector database is reachable
    pub async fn health_check(&self) -> Result<bool> {
        match self.request(Method::GET, "/collections").send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Create both collections if they do not exist yet.
    ///
    /// Runs at most once per gateway; every data operation calls this before
    /// touching a collection, so collections appear lazily on first use.
    pub async fn ensure_collections(&self) -> Result<()> {
        self.ensured
            .get_or_try_init(|| async {
                self.ensure_collection(FRAGMENTS_COLLECTION, self.dimension)
                    .await?;
                self.ensure_collection(DOCUMENTS_COLLECTION, DOCUMENT_DUMMY_VECTOR.len())
                    .await
            })
            .await
            .map(|_| ())
    }

    async fn ensure_collection(&self, name: &str, size: usize) -> Result<()> {
        let exists = self
            .request(Method::GET, &format!("/collections/{}", name))
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("Collection check failed: {}", e)))?
            .status()
            .is_success();

        if exists {
            return Ok(());
        }

        let body = json!({
            "vectors": { "size": size, "distance": "Cosine" }
        });

        let response = self
            .request(Method::PUT, &format!("/collections/{}", name))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("Collection create failed: {}", e)))?;

        match response.status() {
            StatusCode::CONFLICT => Ok(()),
            status if status.is_success() => {
                tracing::info!("Created '{}' collection (dimension {})", name, size);
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::vector_store(format!(
                    "Collection create failed: HTTP {} - {}",
                    status, body
                )))
            }
        }
    }

    /// Upsert points into a collection.
    ///
    /// Fragment vectors must match the active embedding dimension; document
    /// records must carry the degenerate one-dimensional vector. A mismatch
    /// is rejected, never coerced.
    pub async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        self.ensure_collections().await?;

        let expected = match collection {
            FRAGMENTS_COLLECTION => self.dimension,
            _ => DOCUMENT_DUMMY_VECTOR.len(),
        };
        for point in &points {
            if point.vector.len() != expected {
                return Err(Error::vector_store(format!(
                    "Vector dimension mismatch for collection '{}': expected {}, got {}",
                    collection,
                    expected,
                    point.vector.len()
                )));
            }
        }

        let body = json!({
            "points": points
                .iter()
                .map(|p| json!({ "id": p.id, "vector": p.vector, "payload": p.payload }))
                .collect::<Vec<_>>()
        });

        let response = self
            .request(Method::PUT, &format!("/collections/{}/points", collection))
            .query(&[("wait", "true")])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("Upsert failed: {}", e)))?;

        Self::check(response, "Upsert").await.map(|_| ())
    }

    /// Similarity search in a collection, returning the top-k scored points
    pub async fn similarity_search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        filter: Option<serde_json::Value>,
    ) -> Result<Vec<ScoredPoint>> {
        self.ensure_collections().await?;

        let mut body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true
        });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }

        let response = self
            .request(
                Method::POST,
                &format!("/collections/{}/points/search", collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("Search failed: {}", e)))?;

        let response = Self::check(response, "Search").await?;
        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| Error::vector_store(format!("Invalid search response: {}", e)))?;

        Ok(envelope.result)
    }

    /// Filtered scan over a collection's payloads.
    ///
    /// The scroll API pages by point id, not row offset, so the numeric
    /// offset is applied client-side after over-fetching `offset + limit`
    /// points.
    pub async fn query_by_filter(
        &self,
        collection: &str,
        filter: Option<serde_json::Value>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredPoint>> {
        self.ensure_collections().await?;

        let mut body = json!({
            "limit": offset + limit,
            "with_payload": true
        });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }

        let response = self
            .request(
                Method::POST,
                &format!("/collections/{}/points/scroll", collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("Scroll failed: {}", e)))?;

        let response = Self::check(response, "Scroll").await?;
        let envelope: ScrollEnvelope = response
            .json()
            .await
            .map_err(|e| Error::vector_store(format!("Invalid scroll response: {}", e)))?;

        Ok(envelope.result.points.into_iter().skip(offset).collect())
    }

    /// Delete every point matching a filter
    pub async fn delete_by_filter(
        &self,
        collection: &str,
        filter: serde_json::Value,
    ) -> Result<()> {
        self.ensure_collections().await?;

        let body = json!({ "filter": filter });

        let response = self
            .request(
                Method::POST,
                &format!("/collections/{}/points/delete", collection),
            )
            .query(&[("wait", "true")])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("Delete failed: {}", e)))?;

        Self::check(response, "Delete").await.map(|_| ())
    }

    /// Count points in a collection, optionally restricted by a filter
    pub async fn count(
        &self,
        collection: &str,
        filter: Option<serde_json::Value>,
    ) -> Result<usize> {
        self.ensure_collections().await?;

        let mut body = json!({ "exact": true });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }

        let response = self
            .request(
                Method::POST,
                &format!("/collections/{}/points/count", collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("Count failed: {}", e)))?;

        let response = Self::check(response, "Count").await?;
        let envelope: CountEnvelope = response
            .json()
            .await
            .map_err(|e| Error::vector_store(format!("Invalid count response: {}", e)))?;

        Ok(envelope.result.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn match_field_builds_must_clause() {
        let filter = match_field("document_id", "abc");
        assert_eq!(filter["must"][0]["key"], "document_id");
        assert_eq!(filter["must"][0]["match"]["value"], "abc");
    }

    #[test]
    fn match_fields_empty_is_none() {
        assert!(match_fields(&HashMap::new()).is_none());
    }

    #[test]
    fn match_fields_combines_conditions() {
        let mut fields = HashMap::new();
        fields.insert("user_id".to_string(), serde_json::json!("default_user"));
        fields.insert("language".to_string(), serde_json::json!("en"));
        let filter = match_fields(&fields).unwrap();
        assert_eq!(filter["must"].as_array().unwrap().len(), 2);
    }
}
