//! Storage backend construction from configuration.

use crate::retry::{RetryPolicy, RetryingStore};
use crate::{ContentStore, IpfsStore, LocalStore, StorageError, StorageResult};
use digisewa_core::{Config, StorageBackend};
use std::sync::Arc;

/// Create a content store based on configuration, wrapped in the bounded
/// read-retry decorator.
pub async fn create_content_store(config: &Config) -> StorageResult<Arc<dyn ContentStore>> {
    let policy = RetryPolicy {
        max_attempts: config.storage_get_max_attempts(),
        delay: config.storage_get_retry_delay(),
    };

    match config.storage_backend() {
        StorageBackend::Ipfs => {
            let api_url = config.ipfs_api_url().ok_or_else(|| {
                StorageError::ConfigError("IPFS_API_URL not configured".to_string())
            })?;
            let api_token = config.ipfs_api_token().ok_or_else(|| {
                StorageError::ConfigError("IPFS_API_TOKEN not configured".to_string())
            })?;
            let gateway_url = config
                .ipfs_gateway_url()
                .unwrap_or("https://gateway.pinata.cloud");

            let store = IpfsStore::new(api_url, gateway_url, api_token)?;
            Ok(Arc::new(RetryingStore::new(store, policy)))
        }

        StorageBackend::Local => {
            let base_path = config.local_storage_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let store = LocalStore::new(base_path).await?;
            Ok(Arc::new(RetryingStore::new(store, policy)))
        }
    }
}
