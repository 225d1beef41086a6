//! In-memory implementations of the custody seams for tests.
//!
//! These mirror the semantics the orchestrator relies on from the real
//! backends: atomic create visibility, the guarded status update, idempotent
//! grants, and bounded storage failures. Kept as a public module so the API
//! crate's tests can drive a full service without Postgres or a pinning
//! service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use digisewa_core::models::{
    AccessAuditEvent, AccessGrant, DocumentRecord, DocumentStatus, NewAccessAuditEvent,
    NewDocument,
};
use digisewa_core::{AppError, AuditEvents, DocumentRecords};
use digisewa_ledger::{LedgerAnchor, LedgerError, LedgerReceipt, LedgerResult};
use digisewa_storage::{ContentAddress, ContentStore, PutMetadata, StorageError, StorageResult};
use uuid::Uuid;

/// In-memory `DocumentRecords`.
#[derive(Default)]
pub struct MemoryDocumentRecords {
    documents: Mutex<HashMap<Uuid, DocumentRecord>>,
}

impl MemoryDocumentRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records (for all-or-nothing assertions).
    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentRecords for MemoryDocumentRecords {
    async fn create(&self, doc: NewDocument) -> Result<DocumentRecord, AppError> {
        let now = Utc::now();
        let record = DocumentRecord {
            id: doc.id,
            owner_id: doc.owner_id,
            application_id: doc.application_id,
            original_name: doc.original_name,
            mime_type: doc.mime_type,
            byte_size: doc.byte_size,
            content_digest: doc.content_digest,
            content_address: doc.content_address,
            encryption_key: doc.encryption_key,
            iv: doc.iv,
            ledger_tx_hash: doc.ledger_tx_hash,
            status: DocumentStatus::Uploaded,
            department_label: doc.department_label,
            access_code_hash: doc.access_code_hash,
            shared_departments: vec![],
            verified_by: None,
            verification_remarks: None,
            uploaded_at: now,
            updated_at: now,
        };
        self.documents
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<DocumentRecord>, AppError> {
        Ok(self.documents.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_access_code_hash(
        &self,
        code_hash: &str,
    ) -> Result<Option<DocumentRecord>, AppError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .values()
            .find(|d| d.access_code_hash.as_deref() == Some(code_hash))
            .cloned())
    }

    async fn set_status(
        &self,
        id: Uuid,
        next: DocumentStatus,
        verifier_id: &str,
        remarks: Option<&str>,
    ) -> Result<DocumentRecord, AppError> {
        let mut documents = self.documents.lock().unwrap();
        let record = documents
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;
        if !matches!(
            record.status,
            DocumentStatus::Uploaded | DocumentStatus::PendingVerification
        ) {
            return Err(AppError::InvalidTransition {
                from: record.status.to_string(),
                to: next.to_string(),
            });
        }
        record.status = next;
        record.verified_by = Some(verifier_id.to_string());
        record.verification_remarks = remarks.map(String::from);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn attach_application(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> Result<DocumentRecord, AppError> {
        let mut documents = self.documents.lock().unwrap();
        let record = documents
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;
        if record.application_id.is_some() {
            return Err(AppError::Validation(format!(
                "Document {} is already linked to an application",
                id
            )));
        }
        record.application_id = Some(application_id);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn grant_department_access(
        &self,
        id: Uuid,
        grant: AccessGrant,
    ) -> Result<DocumentRecord, AppError> {
        let mut documents = self.documents.lock().unwrap();
        let record = documents
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;
        if let Some(existing) = record
            .shared_departments
            .iter_mut()
            .find(|g| g.department_id == grant.department_id)
        {
            *existing = grant;
        } else {
            record.shared_departments.push(grant);
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

/// In-memory `AuditEvents`.
#[derive(Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AccessAuditEvent>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditEvents for MemoryAuditLog {
    async fn record_access(&self, event: NewAccessAuditEvent) -> Result<(), AppError> {
        self.events.lock().unwrap().push(AccessAuditEvent {
            id: Uuid::new_v4(),
            document_id: event.document_id,
            accessed_by: event.accessed_by,
            role: event.role,
            accessed_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<AccessAuditEvent>, AppError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect())
    }
}

/// In-memory `ContentStore` with switchable failure modes and a tamper hook.
#[derive(Default)]
pub struct MemoryContentStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts: Mutex<bool>,
    get_failures_remaining: AtomicU32,
    get_attempts: AtomicU32,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self) {
        *self.fail_puts.lock().unwrap() = true;
    }

    /// Make the next `n` get calls fail before recovering.
    pub fn fail_next_gets(&self, n: u32) {
        self.get_failures_remaining.store(n, Ordering::SeqCst);
    }

    pub fn get_attempts(&self) -> u32 {
        self.get_attempts.load(Ordering::SeqCst)
    }

    /// Flip one byte of a stored blob, simulating tampering at rest.
    pub fn tamper(&self, address: &str) {
        let mut blobs = self.blobs.lock().unwrap();
        if let Some(blob) = blobs.get_mut(address) {
            if let Some(byte) = blob.first_mut() {
                *byte ^= 0x01;
            }
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, data: Vec<u8>, _metadata: PutMetadata) -> StorageResult<ContentAddress> {
        if *self.fail_puts.lock().unwrap() {
            return Err(StorageError::Unavailable(
                "pinning service down (stub)".to_string(),
            ));
        }
        let address = format!("Qm{}", Uuid::new_v4().simple());
        self.blobs
            .lock()
            .unwrap()
            .insert(address.clone(), data);
        Ok(ContentAddress::new(address))
    }

    async fn get(&self, address: &ContentAddress) -> StorageResult<Vec<u8>> {
        self.get_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.get_failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.get_failures_remaining
                .store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::Unavailable(
                "gateway timeout (stub)".to_string(),
            ));
        }

        self.blobs
            .lock()
            .unwrap()
            .get(address.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(address.to_string()))
    }
}

/// Ledger stub returning a fixed tx hash.
pub struct StaticLedger {
    pub tx_hash: String,
    /// Digest the stub claims is anchored, for verify calls.
    pub anchored_digest: Mutex<Option<String>>,
}

impl StaticLedger {
    pub fn new(tx_hash: impl Into<String>) -> Self {
        StaticLedger {
            tx_hash: tx_hash.into(),
            anchored_digest: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LedgerAnchor for StaticLedger {
    async fn anchor(
        &self,
        _document_id: Uuid,
        content_digest: &str,
        _department_label: &str,
    ) -> LedgerResult<LedgerReceipt> {
        *self.anchored_digest.lock().unwrap() = Some(content_digest.to_string());
        Ok(LedgerReceipt {
            tx_hash: self.tx_hash.clone(),
        })
    }

    async fn verify(&self, _document_id: Uuid, content_digest: &str) -> LedgerResult<bool> {
        Ok(self.anchored_digest.lock().unwrap().as_deref() == Some(content_digest))
    }
}

/// Ledger stub that always fails, for the degrade path.
pub struct FailingLedger;

#[async_trait]
impl LedgerAnchor for FailingLedger {
    async fn anchor(
        &self,
        _document_id: Uuid,
        _content_digest: &str,
        _department_label: &str,
    ) -> LedgerResult<LedgerReceipt> {
        Err(LedgerError::Unreachable("chain node down (stub)".to_string()))
    }

    async fn verify(&self, _document_id: Uuid, _content_digest: &str) -> LedgerResult<bool> {
        Err(LedgerError::Unreachable("chain node down (stub)".to_string()))
    }
}
