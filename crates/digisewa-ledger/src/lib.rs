//! DigiSewa Ledger Library
//!
//! Best-effort hash anchoring on an external blockchain ledger. The custody
//! pipeline records `(document id, content digest, department)` through a
//! chain-client service and stores the returned transaction hash; when the
//! service is down or unconfigured, ingest proceeds without it.
//!
//! The client is constructed from an explicit `LedgerSettings` value - it
//! never reads the environment itself.

use async_trait::async_trait;
use digisewa_core::LedgerSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Ledger operation errors. Callers of `anchor` treat every variant as the
/// same degrade path; the distinction exists for logs.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger service unreachable: {0}")]
    Unreachable(String),

    #[error("Ledger service rejected the request: {0}")]
    Rejected(String),

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Receipt of a successful anchor call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReceipt {
    pub tx_hash: String,
}

/// External ledger seam. Implemented by `HttpLedgerClient` in production and
/// by stubs in orchestrator tests.
#[async_trait]
pub trait LedgerAnchor: Send + Sync {
    /// Record the document's content digest on the ledger.
    async fn anchor(
        &self,
        document_id: Uuid,
        content_digest: &str,
        department_label: &str,
    ) -> LedgerResult<LedgerReceipt>;

    /// Read back the anchored digest for a document and compare. Used for
    /// integrity display only, never for authorization.
    async fn verify(&self, document_id: Uuid, content_digest: &str) -> LedgerResult<bool>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnchorRequest<'a> {
    document_id: Uuid,
    content_digest: &'a str,
    department: &'a str,
    contract_address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnchorResponse {
    tx_hash: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    document_id: Uuid,
    contract_address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    content_digest: Option<String>,
}

/// HTTP client for the chain-client service.
#[derive(Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    endpoint: String,
    contract_address: String,
    api_key: Option<String>,
}

impl HttpLedgerClient {
    pub fn new(settings: LedgerSettings) -> LedgerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LedgerError::Unreachable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpLedgerClient {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            contract_address: settings.contract_address,
            api_key: settings.api_key,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(format!("{}{}", self.endpoint, path));
        if let Some(ref key) = self.api_key {
            builder = builder.header("x-api-key", key);
        }
        builder
    }
}

#[async_trait]
impl LedgerAnchor for HttpLedgerClient {
    async fn anchor(
        &self,
        document_id: Uuid,
        content_digest: &str,
        department_label: &str,
    ) -> LedgerResult<LedgerReceipt> {
        let start = std::time::Instant::now();

        let response = self
            .request("/anchor")
            .json(&AnchorRequest {
                document_id,
                content_digest,
                department: department_label,
                contract_address: &self.contract_address,
            })
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("Anchor request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LedgerError::Rejected(format!(
                "Anchor returned {}",
                response.status()
            )));
        }

        let body: AnchorResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            document_id = %document_id,
            tx_hash = %body.tx_hash,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Document digest anchored"
        );

        Ok(LedgerReceipt {
            tx_hash: body.tx_hash,
        })
    }

    async fn verify(&self, document_id: Uuid, content_digest: &str) -> LedgerResult<bool> {
        let response = self
            .request("/verify")
            .json(&VerifyRequest {
                document_id,
                contract_address: &self.contract_address,
            })
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("Verify request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LedgerError::Rejected(format!(
                "Verify returned {}",
                response.status()
            )));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        Ok(body
            .content_digest
            .map(|anchored| anchored == content_digest)
            .unwrap_or(false))
    }
}
