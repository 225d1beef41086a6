//! IPFS pinning-service backend.
//!
//! `put` pins the blob through the service's HTTP API
//! (`POST {api}/pinning/pinFileToIPFS`, bearer token, multipart body) and
//! returns the CID; `get` fetches the blob from the configured gateway.
//! The service only ever sees ciphertext.

use crate::traits::{ContentAddress, ContentStore, PutMetadata, StorageError, StorageResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Pinning-service client.
#[derive(Clone)]
pub struct IpfsStore {
    http: reqwest::Client,
    api_url: String,
    gateway_url: String,
    api_token: String,
}

impl IpfsStore {
    pub fn new(
        api_url: impl Into<String>,
        gateway_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(IpfsStore {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        })
    }
}

#[async_trait]
impl ContentStore for IpfsStore {
    async fn put(&self, data: Vec<u8>, metadata: PutMetadata) -> StorageResult<ContentAddress> {
        let size = data.len();
        let start = std::time::Instant::now();

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(metadata.name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| StorageError::Unavailable(format!("Invalid multipart body: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .bearer_auth(&self.api_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Pin request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StorageError::Unavailable(format!(
                "Pinning service returned {}",
                response.status()
            )));
        }

        let pin: PinResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Invalid pin response: {}", e)))?;

        tracing::info!(
            cid = %pin.ipfs_hash,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Blob pinned"
        );

        Ok(ContentAddress::new(pin.ipfs_hash))
    }

    async fn get(&self, address: &ContentAddress) -> StorageResult<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/ipfs/{}", self.gateway_url, address))
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Gateway request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(address.to_string()));
        }
        if !response.status().is_success() {
            return Err(StorageError::Unavailable(format!(
                "Gateway returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Gateway read failed: {}", e)))?;

        Ok(bytes.to_vec())
    }
}
