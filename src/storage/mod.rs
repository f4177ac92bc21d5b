//! Attachment storage: object keys, the object store seam, virus scanning
//! and signed download URLs.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

pub mod scanner;
pub mod signed_url;

pub use scanner::VirusScanner;
pub use signed_url::UrlSigner;

use crate::config::{StorageConfig, VirusScanConfig};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Malicious content detected: {0}")]
    Infected(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Virus scanner unavailable: {0}")]
    ScannerUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// `projects/{projectId}/{fileName}`
pub fn project_key(project_id: i32, file_name: &str) -> Result<String, StorageError> {
    Ok(format!("projects/{}/{}", project_id, checked_file_name(file_name)?))
}

/// `drafts/{draftId}/{fileName}`
pub fn draft_key(draft_id: i32, file_name: &str) -> Result<String, StorageError> {
    Ok(format!("drafts/{}/{}", draft_id, checked_file_name(file_name)?))
}

fn checked_file_name(file_name: &str) -> Result<&str, StorageError> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidKey(file_name.to_string()));
    }
    Ok(trimmed)
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, body: &[u8], content_type: Option<&str>) -> Result<(), StorageError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Objects stored as files below a root directory.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty() && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, body: &[u8], _content_type: Option<&str>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(body).await?;
        file.flush().await?;
        tracing::debug!(key, bytes = body.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // already gone
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Everything an upload touches: size limit, scanner, store and URL signer.
#[derive(Clone)]
pub struct FileStorage {
    pub store: Arc<dyn ObjectStore>,
    pub scanner: VirusScanner,
    pub signer: UrlSigner,
    pub max_upload_bytes: usize,
}

impl FileStorage {
    pub fn from_config(storage: &StorageConfig, virus_scan: &VirusScanConfig, max_upload_bytes: usize) -> Self {
        Self {
            store: Arc::new(LocalObjectStore::new(&storage.root_dir)),
            scanner: VirusScanner::from_config(virus_scan),
            signer: UrlSigner::from_config(storage),
            max_upload_bytes,
        }
    }

    /// Scan then store. Nothing is written when the scan fails.
    pub async fn scan_and_put(&self, key: &str, body: &[u8], content_type: Option<&str>) -> Result<(), StorageError> {
        self.scanner.scan(body).await?;
        self.store.put(key, body, content_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("restoration-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn keys_follow_the_owner_layout() {
        assert_eq!(project_key(4, "report.pdf").unwrap(), "projects/4/report.pdf");
        assert_eq!(draft_key(9, " thumb.png ").unwrap(), "drafts/9/thumb.png");
        assert!(project_key(4, "../etc/passwd").is_err());
        assert!(project_key(4, "..").is_err());
        assert!(draft_key(9, "").is_err());
    }

    #[tokio::test]
    async fn local_store_round_trip() {
        let root = temp_root();
        let store = LocalObjectStore::new(&root);

        store.put("projects/1/a.txt", b"hello", Some("text/plain")).await.unwrap();
        assert_eq!(store.get("projects/1/a.txt").await.unwrap(), b"hello");

        store.delete("projects/1/a.txt").await.unwrap();
        assert!(matches!(store.get("projects/1/a.txt").await, Err(StorageError::NotFound(_))));
        store.delete("projects/1/a.txt").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn local_store_rejects_escaping_keys() {
        let store = LocalObjectStore::new(temp_root());
        assert!(matches!(store.put("../x", b"", None).await, Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.get("/etc/passwd").await, Err(StorageError::InvalidKey(_))));
    }
}
