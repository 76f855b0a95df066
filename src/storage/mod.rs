//! Local filesystem storage for uploaded documents

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::Result;

/// Compute the SHA-256 checksum of content as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Stores uploaded files under the configured uploads directory as
/// `{document_id}_{filename}`
pub struct LocalDocumentStore {
    upload_dir: PathBuf,
}

impl LocalDocumentStore {
    /// Create a store over the configured uploads directory
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
        }
    }

    /// Persist an upload, returning its storage URI
    pub async fn store(&self, document_id: Uuid, filename: &str, data: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        // Strip any path components a hostile filename might carry
        let safe_name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let path = self.upload_dir.join(format!("{}_{}", document_id, safe_name));
        tokio::fs::write(&path, data).await?;

        Ok(path.to_string_lossy().to_string())
    }

    /// Remove a stored upload; a missing file is not an error
    pub async fn delete(&self, storage_uri: &str) -> Result<()> {
        match tokio::fs::remove_file(storage_uri).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> LocalDocumentStore {
        LocalDocumentStore::new(&StorageConfig {
            upload_dir: dir.to_path_buf(),
        })
    }

    #[tokio::test]
    async fn stores_and_deletes_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let id = Uuid::new_v4();

        let uri = store.store(id, "notes.txt", b"hello").await.unwrap();
        assert!(uri.contains(&id.to_string()));
        assert_eq!(std::fs::read(&uri).unwrap(), b"hello");

        store.delete(&uri).await.unwrap();
        assert!(!Path::new(&uri).exists());
        // Deleting again is a no-op
        store.delete(&uri).await.unwrap();
    }

    #[tokio::test]
    async fn path_components_are_stripped_from_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let id = Uuid::new_v4();

        let uri = store.store(id, "../../etc/passwd", b"x").await.unwrap();
        assert!(Path::new(&uri).starts_with(dir.path()));
        assert!(uri.ends_with("passwd"));
    }

    #[test]
    fn checksum_is_stable_hex() {
        let a = sha256_hex(b"content");
        let b = sha256_hex(b"content");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, sha256_hex(b"other"));
    }
}
