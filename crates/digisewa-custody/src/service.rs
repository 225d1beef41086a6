//! Document custody orchestrator.
//!
//! Ingest pipeline: validate -> digest -> encrypt -> pin -> anchor ->
//! persist. Storage is mandatory and its failure aborts the ingest before
//! anything is persisted; ledger anchoring is best-effort and its failure
//! only downgrades the receipt to `ledger_tx_hash = None`. Retrieval:
//! load -> authorize -> fetch -> decrypt -> optional digest check.

use std::sync::Arc;

use digisewa_core::models::{
    AccessGrant, AccessPolicy, DocumentRecord, DocumentStatus, IngestReceipt, NewDocument,
    Requester,
};
use digisewa_core::{hashing, validation, AppError, DocumentCipher, DocumentRecords};
use digisewa_ledger::LedgerAnchor;
use digisewa_storage::{ContentAddress, ContentStore, PutMetadata, StorageError};
use uuid::Uuid;

use crate::gate::AccessGate;

/// Upload request as handed over by the HTTP layer.
#[derive(Debug)]
pub struct IngestRequest {
    pub plaintext: Vec<u8>,
    pub original_name: String,
    pub mime_type: String,
    pub owner_id: String,
    pub department_label: String,
    pub application_id: Option<Uuid>,
    /// Optional share secret; only its hash is persisted.
    pub access_code: Option<String>,
}

/// Retrieval knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrieveOptions {
    /// Recompute the plaintext digest and compare against the stored one.
    pub verify_integrity: bool,
}

/// Decrypted document handed back to the caller.
#[derive(Debug)]
pub struct RetrievedDocument {
    pub document_id: Uuid,
    pub plaintext: Vec<u8>,
    pub original_name: String,
    pub mime_type: String,
}

/// Outcome of reading the ledger anchor back for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorVerification {
    /// No tx hash on record, or anchoring is not configured.
    NotAnchored,
    Verified { tx_hash: String },
    Mismatch { tx_hash: String },
    /// Ledger could not be reached; display-only, so not an error.
    Unavailable,
}

fn storage_error(err: StorageError) -> AppError {
    match err {
        StorageError::InvalidAddress(msg) => {
            AppError::Internal(format!("Invalid content address: {}", msg))
        }
        other => AppError::StorageUnavailable(other.to_string()),
    }
}

/// Orchestrates the custody pipeline over the injected seams.
pub struct CustodyService {
    records: Arc<dyn DocumentRecords>,
    store: Arc<dyn ContentStore>,
    ledger: Option<Arc<dyn LedgerAnchor>>,
    gate: AccessGate,
    cipher: DocumentCipher,
    known_departments: Vec<String>,
    max_document_size_bytes: usize,
}

impl CustodyService {
    pub fn new(
        records: Arc<dyn DocumentRecords>,
        store: Arc<dyn ContentStore>,
        ledger: Option<Arc<dyn LedgerAnchor>>,
        gate: AccessGate,
        known_departments: Vec<String>,
        max_document_size_bytes: usize,
    ) -> Self {
        CustodyService {
            records,
            store,
            ledger,
            gate,
            cipher: DocumentCipher::new(),
            known_departments,
            max_document_size_bytes,
        }
    }

    /// Ingest one document. All-or-nothing except the ledger step.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReceipt, AppError> {
        validation::validate_ingest(
            &request.plaintext,
            &request.owner_id,
            self.max_document_size_bytes,
        )?;
        let original_name = validation::sanitize_filename(&request.original_name)?;

        // Minted now so the ledger anchor and the persisted record share it.
        let document_id = Uuid::new_v4();

        let content_digest = hashing::digest(&request.plaintext);

        let key = self.cipher.generate_key();
        let (ciphertext, iv) = self.cipher.encrypt(&request.plaintext, &key)?;

        // Storage is mandatory: a pin failure fails the whole ingest and
        // nothing has been persisted yet.
        let content_address = self
            .store
            .put(
                ciphertext,
                PutMetadata {
                    name: original_name.clone(),
                    mime_type: request.mime_type.clone(),
                },
            )
            .await
            .map_err(storage_error)?;

        tracing::info!(
            owner_id = %request.owner_id,
            content_address = %content_address,
            byte_size = request.plaintext.len(),
            "Ciphertext stored"
        );

        let ledger_tx_hash = self
            .anchor_best_effort(document_id, &content_digest, &request.department_label)
            .await;

        let document = self
            .records
            .create(NewDocument {
                id: document_id,
                owner_id: request.owner_id,
                application_id: request.application_id,
                original_name,
                mime_type: request.mime_type,
                byte_size: request.plaintext.len() as i64,
                content_digest: content_digest.clone(),
                content_address: content_address.into_string(),
                encryption_key: key,
                iv,
                ledger_tx_hash: ledger_tx_hash.clone(),
                department_label: request.department_label,
                access_code_hash: request
                    .access_code
                    .as_deref()
                    .map(hashing::digest_access_code),
            })
            .await?;

        tracing::info!(
            document_id = %document.id,
            anchored = ledger_tx_hash.is_some(),
            "Document ingested"
        );

        Ok(IngestReceipt {
            document_id: document.id,
            content_address: document.content_address,
            content_digest,
            ledger_tx_hash,
        })
    }

    /// Anchor the digest if a ledger is configured and the department is
    /// known. Every failure mode collapses into "no tx hash".
    async fn anchor_best_effort(
        &self,
        document_id: Uuid,
        content_digest: &str,
        department_label: &str,
    ) -> Option<String> {
        let ledger = self.ledger.as_ref()?;

        if !self
            .known_departments
            .iter()
            .any(|d| d == department_label)
        {
            tracing::warn!(
                department = %department_label,
                "Unknown department label; skipping ledger anchoring"
            );
            return None;
        }

        match ledger
            .anchor(document_id, content_digest, department_label)
            .await
        {
            Ok(receipt) => Some(receipt.tx_hash),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    department = %department_label,
                    "Ledger anchoring failed; continuing without tx hash"
                );
                None
            }
        }
    }

    /// Identity-based retrieval.
    pub async fn retrieve(
        &self,
        document_id: Uuid,
        requester: &Requester,
        options: RetrieveOptions,
    ) -> Result<RetrievedDocument, AppError> {
        let document = self.load(document_id).await?;
        self.gate.authorize(requester, &document).await?;
        self.fetch_and_decrypt(&document, options).await
    }

    /// Possession-of-secret retrieval: look the document up by the hash of
    /// the supplied code, then run the code through the gate.
    pub async fn retrieve_by_code(
        &self,
        access_code: &str,
        options: RetrieveOptions,
    ) -> Result<RetrievedDocument, AppError> {
        let code_hash = hashing::digest_access_code(access_code);
        let document = self
            .records
            .find_by_access_code_hash(&code_hash)
            .await?
            .ok_or_else(|| {
                AppError::AccessDenied("Access code does not match any document".to_string())
            })?;
        self.gate.authorize_by_code(access_code, &document)?;
        self.fetch_and_decrypt(&document, options).await
    }

    async fn fetch_and_decrypt(
        &self,
        document: &DocumentRecord,
        options: RetrieveOptions,
    ) -> Result<RetrievedDocument, AppError> {
        let address = ContentAddress::new(document.content_address.clone());
        let ciphertext = self.store.get(&address).await.map_err(storage_error)?;

        let plaintext = self
            .cipher
            .decrypt(&ciphertext, &document.encryption_key, &document.iv)?;

        if options.verify_integrity {
            let actual = hashing::digest(&plaintext);
            if !hashing::digests_match(&document.content_digest, &actual) {
                return Err(AppError::Integrity {
                    expected: document.content_digest.clone(),
                    actual,
                });
            }
        }

        Ok(RetrievedDocument {
            document_id: document.id,
            plaintext,
            original_name: document.original_name.clone(),
            mime_type: document.mime_type.clone(),
        })
    }

    /// Verifier decision. Only officers and admins; only the legal
    /// transitions out of uploaded/pending_verification.
    pub async fn set_status(
        &self,
        document_id: Uuid,
        next: DocumentStatus,
        requester: &Requester,
        remarks: Option<&str>,
    ) -> Result<DocumentRecord, AppError> {
        if !requester.role.can_verify() {
            return Err(AppError::AccessDenied(format!(
                "Role {} may not verify documents",
                requester.role
            )));
        }

        let current = self.load(document_id).await?;
        if !current.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: current.status.to_string(),
                to: next.to_string(),
            });
        }

        let updated = self
            .records
            .set_status(document_id, next, &requester.id, remarks)
            .await?;

        tracing::info!(
            document_id = %document_id,
            status = %next,
            verified_by = %requester.id,
            "Document status updated"
        );

        Ok(updated)
    }

    /// Share the document with a department. Idempotent: re-granting
    /// refreshes the policy and timestamp.
    pub async fn grant_department_access(
        &self,
        document_id: Uuid,
        department_id: &str,
        access_policy: AccessPolicy,
        requester: &Requester,
    ) -> Result<DocumentRecord, AppError> {
        let document = self.load(document_id).await?;
        if requester.id != document.owner_id && !requester.role.is_privileged() {
            return Err(AppError::AccessDenied(format!(
                "Requester {} may not share document {}",
                requester.id, document_id
            )));
        }

        let updated = self
            .records
            .grant_department_access(
                document_id,
                AccessGrant {
                    department_id: department_id.to_string(),
                    access_policy,
                    granted_by: requester.id.clone(),
                    granted_at: chrono::Utc::now(),
                },
            )
            .await?;

        tracing::info!(
            document_id = %document_id,
            department = %department_id,
            policy = %access_policy,
            "Department access granted"
        );

        Ok(updated)
    }

    /// Link the document to the application it supports, once.
    pub async fn attach_application(
        &self,
        document_id: Uuid,
        application_id: Uuid,
        requester: &Requester,
    ) -> Result<DocumentRecord, AppError> {
        let document = self.load(document_id).await?;
        if requester.id != document.owner_id {
            return Err(AppError::AccessDenied(format!(
                "Requester {} may not modify document {}",
                requester.id, document_id
            )));
        }
        self.records
            .attach_application(document_id, application_id)
            .await
    }

    /// Read the ledger anchor back for integrity display. Never used for
    /// authorization, and ledger unavailability is a display state, not an
    /// error.
    pub async fn verify_anchor(
        &self,
        document_id: Uuid,
        requester: &Requester,
    ) -> Result<AnchorVerification, AppError> {
        let document = self.load(document_id).await?;
        self.gate.authorize(requester, &document).await?;

        let (tx_hash, ledger) = match (&document.ledger_tx_hash, &self.ledger) {
            (Some(tx), Some(ledger)) => (tx.clone(), ledger),
            _ => return Ok(AnchorVerification::NotAnchored),
        };

        match ledger
            .verify(document.id, &document.content_digest)
            .await
        {
            Ok(true) => Ok(AnchorVerification::Verified { tx_hash }),
            Ok(false) => Ok(AnchorVerification::Mismatch { tx_hash }),
            Err(e) => {
                tracing::warn!(
                    document_id = %document_id,
                    error = %e,
                    "Ledger verification unavailable"
                );
                Ok(AnchorVerification::Unavailable)
            }
        }
    }

    /// Public record view (no plaintext fetch). Goes through the gate like
    /// any other read.
    pub async fn describe(
        &self,
        document_id: Uuid,
        requester: &Requester,
    ) -> Result<DocumentRecord, AppError> {
        let document = self.load(document_id).await?;
        self.gate.authorize(requester, &document).await?;
        Ok(document)
    }

    async fn load(&self, document_id: Uuid) -> Result<DocumentRecord, AppError> {
        self.records
            .get(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))
    }
}
