//! Local filesystem content store for development and tests.
//!
//! Blobs are keyed by their SHA-256 digest, sharded by the first two hex
//! characters (`ab/abcdef...`), which makes `put` naturally idempotent for
//! identical content.

use crate::traits::{ContentAddress, ContentStore, PutMetadata, StorageError, StorageResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at `base_path`, creating it if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore { base_path })
    }

    /// Convert a content address to a filesystem path with validation.
    /// Addresses are hex digests, so anything with path characters is
    /// rejected before touching the filesystem.
    fn address_to_path(&self, address: &ContentAddress) -> StorageResult<PathBuf> {
        let key = address.as_str();
        if key.len() < 3 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidAddress(format!(
                "Not a local blob address: {}",
                key
            )));
        }
        Ok(self.base_path.join(&key[..2]).join(key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    async fn put(&self, data: Vec<u8>, _metadata: PutMetadata) -> StorageResult<ContentAddress> {
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let address = ContentAddress::new(hex::encode(hasher.finalize()));

        let path = self.address_to_path(&address)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to create blob {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to write blob {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to sync blob {}: {}", path.display(), e))
        })?;

        tracing::info!(
            address = %address,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local blob stored"
        );

        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> StorageResult<Vec<u8>> {
        let path = self.address_to_path(address)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(address.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to read blob {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let data = b"opaque ciphertext bytes".to_vec();
        let address = store.put(data.clone(), PutMetadata::default()).await.unwrap();
        let fetched = store.get(&address).await.unwrap();

        assert_eq!(fetched, data);
    }

    #[tokio::test]
    async fn test_put_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let a = store.put(b"same".to_vec(), PutMetadata::default()).await.unwrap();
        let b = store.put(b"same".to_vec(), PutMetadata::default()).await.unwrap();
        let c = store.put(b"other".to_vec(), PutMetadata::default()).await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_get_missing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let missing = ContentAddress::new(
            "0000000000000000000000000000000000000000000000000000000000000000",
        );
        assert!(matches!(
            store.get(&missing).await.unwrap_err(),
            StorageError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_traversal_address_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let hostile = ContentAddress::new("../../etc/passwd");
        assert!(matches!(
            store.get(&hostile).await.unwrap_err(),
            StorageError::InvalidAddress(_)
        ));
    }
}
