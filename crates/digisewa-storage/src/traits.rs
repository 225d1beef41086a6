//! Storage abstraction trait
//!
//! This module defines the ContentStore trait that all storage backends must
//! implement, and the error type they surface.

use async_trait::async_trait;
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid content address: {0}")]
    InvalidAddress(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Content identifier returned by `put`. For the IPFS backend this is the
/// CID of the pinned ciphertext; for the local backend, its digest key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentAddress(String);

impl ContentAddress {
    pub fn new(address: impl Into<String>) -> Self {
        ContentAddress(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for ContentAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContentAddress {
    fn from(s: String) -> Self {
        ContentAddress(s)
    }
}

/// Descriptive metadata attached to a stored blob. The pinning service uses
/// it for display only; it never affects addressing.
#[derive(Debug, Clone, Default)]
pub struct PutMetadata {
    pub name: String,
    pub mime_type: String,
}

/// Content-addressable storage abstraction.
///
/// Blobs are opaque bytes (the custody pipeline always stores ciphertext).
/// `put` is not idempotent from the caller's perspective and is never
/// retried; `get` is idempotent and callers wrap it in `RetryingStore`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload a blob and return its content address.
    async fn put(&self, data: Vec<u8>, metadata: PutMetadata) -> StorageResult<ContentAddress>;

    /// Fetch a previously stored blob by its content address.
    async fn get(&self, address: &ContentAddress) -> StorageResult<Vec<u8>>;
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for std::sync::Arc<S> {
    async fn put(&self, data: Vec<u8>, metadata: PutMetadata) -> StorageResult<ContentAddress> {
        (**self).put(data, metadata).await
    }

    async fn get(&self, address: &ContentAddress) -> StorageResult<Vec<u8>> {
        (**self).get(address).await
    }
}
