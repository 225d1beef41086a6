//! End-to-end custody pipeline tests against in-memory seams.

use std::sync::Arc;
use std::time::Duration;

use digisewa_core::models::{AccessPolicy, DocumentStatus, Requester};
use digisewa_core::{hashing, AppError, AuditEvents, DocumentRecords};
use digisewa_custody::testkit::{
    FailingLedger, MemoryAuditLog, MemoryContentStore, MemoryDocumentRecords, StaticLedger,
};
use digisewa_custody::{
    AccessGate, AnchorVerification, CustodyService, IngestRequest, RetrieveOptions,
};
use digisewa_ledger::LedgerAnchor;
use digisewa_storage::{ContentStore, RetryPolicy, RetryingStore};
use uuid::Uuid;

const MAX_SIZE: usize = 10 * 1024 * 1024;

struct Harness {
    service: CustodyService,
    records: Arc<MemoryDocumentRecords>,
    audit: Arc<MemoryAuditLog>,
    store: Arc<MemoryContentStore>,
}

fn harness_with(
    ledger: Option<Arc<dyn LedgerAnchor>>,
    wrap_retry: Option<RetryPolicy>,
) -> Harness {
    let records = Arc::new(MemoryDocumentRecords::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let store = Arc::new(MemoryContentStore::new());

    let content_store: Arc<dyn ContentStore> = match wrap_retry {
        Some(policy) => Arc::new(RetryingStore::new(Arc::clone(&store), policy)),
        None => store.clone(),
    };

    let service = CustodyService::new(
        records.clone(),
        content_store,
        ledger,
        AccessGate::new(audit.clone()),
        vec!["Revenue Department".to_string(), "Transport Department".to_string()],
        MAX_SIZE,
    );

    Harness {
        service,
        records,
        audit,
        store,
    }
}

fn harness() -> Harness {
    harness_with(Some(Arc::new(StaticLedger::new("0xabc123"))), None)
}

fn ingest_request(owner: &str) -> IngestRequest {
    IngestRequest {
        plaintext: b"hello government".to_vec(),
        original_name: "certificate.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        owner_id: owner.to_string(),
        department_label: "Revenue Department".to_string(),
        application_id: None,
        access_code: None,
    }
}

#[tokio::test]
async fn test_end_to_end_ingest_and_retrieve() {
    let h = harness();

    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();

    assert!(!receipt.content_address.is_empty());
    assert_eq!(receipt.content_digest, hashing::digest(b"hello government"));
    assert_eq!(receipt.ledger_tx_hash.as_deref(), Some("0xabc123"));

    let retrieved = h
        .service
        .retrieve(
            receipt.document_id,
            &Requester::citizen("u1"),
            RetrieveOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(retrieved.plaintext, b"hello government");
    assert_eq!(retrieved.original_name, "certificate.pdf");
    assert_eq!(retrieved.mime_type, "application/pdf");
    // Owner access leaves no audit trail
    assert!(h.audit.is_empty());
}

#[tokio::test]
async fn test_ciphertext_is_stored_not_plaintext() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();

    let record = h.records.get(receipt.document_id).await.unwrap().unwrap();
    let stored = h
        .store
        .get(&digisewa_storage::ContentAddress::new(
            record.content_address.clone(),
        ))
        .await
        .unwrap();

    assert_ne!(stored, b"hello government".to_vec());
    // GCM tag adds 16 bytes
    assert_eq!(stored.len(), b"hello government".len() + 16);
}

#[tokio::test]
async fn test_ledger_failure_degrades_gracefully() {
    let h = harness_with(Some(Arc::new(FailingLedger)), None);

    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();

    assert!(receipt.ledger_tx_hash.is_none());
    // The document is still fully retrievable
    let retrieved = h
        .service
        .retrieve(
            receipt.document_id,
            &Requester::citizen("u1"),
            RetrieveOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(retrieved.plaintext, b"hello government");
}

#[tokio::test]
async fn test_no_ledger_configured_is_same_degrade_path() {
    let h = harness_with(None, None);

    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    assert!(receipt.ledger_tx_hash.is_none());
}

#[tokio::test]
async fn test_unknown_department_skips_anchoring() {
    let h = harness();

    let mut request = ingest_request("u1");
    request.department_label = "Ministry of Silly Walks".to_string();

    let receipt = h.service.ingest(request).await.unwrap();
    assert!(receipt.ledger_tx_hash.is_none());
}

#[tokio::test]
async fn test_storage_failure_is_fatal_and_persists_nothing() {
    let h = harness();
    h.store.fail_puts();

    let err = h.service.ingest(ingest_request("u1")).await.unwrap_err();

    assert!(matches!(err, AppError::StorageUnavailable(_)));
    assert!(h.records.is_empty());
}

#[tokio::test]
async fn test_empty_document_rejected_before_side_effects() {
    let h = harness();

    let mut request = ingest_request("u1");
    request.plaintext = vec![];

    let err = h.service.ingest(request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.records.is_empty());
}

#[tokio::test]
async fn test_plain_citizen_cannot_read_others_documents() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();

    let err = h
        .service
        .retrieve(
            receipt.document_id,
            &Requester::citizen("u2"),
            RetrieveOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccessDenied(_)));
    assert!(h.audit.is_empty());
}

#[tokio::test]
async fn test_officer_access_is_permitted_and_audited_once() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();

    let officer = Requester::officer("off-7", "Revenue Department");
    let retrieved = h
        .service
        .retrieve(receipt.document_id, &officer, RetrieveOptions::default())
        .await
        .unwrap();

    assert_eq!(retrieved.plaintext, b"hello government");
    let events = h.audit.list_for_document(receipt.document_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].accessed_by, "off-7");
}

#[tokio::test]
async fn test_tampered_ciphertext_fails_decryption() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();

    h.store.tamper(&receipt.content_address);

    let err = h
        .service
        .retrieve(
            receipt.document_id,
            &Requester::citizen("u1"),
            RetrieveOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Decryption(_)));
}

#[tokio::test]
async fn test_digest_mismatch_raises_integrity_error() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    let genuine = h.records.get(receipt.document_id).await.unwrap().unwrap();

    // A record whose stored digest does not describe the (decryptable)
    // ciphertext it points at: same blob, same key material, wrong digest.
    let forged_id = Uuid::new_v4();
    h.records
        .create(digisewa_core::models::NewDocument {
            id: forged_id,
            owner_id: "u1".to_string(),
            application_id: None,
            original_name: genuine.original_name.clone(),
            mime_type: genuine.mime_type.clone(),
            byte_size: genuine.byte_size,
            content_digest: hashing::digest(b"some other content"),
            content_address: genuine.content_address.clone(),
            encryption_key: genuine.encryption_key.clone(),
            iv: genuine.iv.clone(),
            ledger_tx_hash: None,
            department_label: genuine.department_label.clone(),
            access_code_hash: None,
        })
        .await
        .unwrap();

    let err = h
        .service
        .retrieve(
            forged_id,
            &Requester::citizen("u1"),
            RetrieveOptions {
                verify_integrity: true,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Integrity { .. }));
}

#[tokio::test]
async fn test_bounded_retry_succeeds_on_final_attempt() {
    let policy = RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(1),
    };
    let h = harness_with(Some(Arc::new(StaticLedger::new("0xabc"))), Some(policy));

    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    h.store.fail_next_gets(2);

    let retrieved = h
        .service
        .retrieve(
            receipt.document_id,
            &Requester::citizen("u1"),
            RetrieveOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(retrieved.plaintext, b"hello government");
    assert_eq!(h.store.get_attempts(), 3);
}

#[tokio::test]
async fn test_bounded_retry_exhausts_after_max_attempts() {
    let policy = RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(1),
    };
    let h = harness_with(Some(Arc::new(StaticLedger::new("0xabc"))), Some(policy));

    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    h.store.fail_next_gets(u32::MAX);

    let err = h
        .service
        .retrieve(
            receipt.document_id,
            &Requester::citizen("u1"),
            RetrieveOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::StorageUnavailable(_)));
    assert_eq!(h.store.get_attempts(), 3);
}

#[tokio::test]
async fn test_retrieve_by_access_code() {
    let h = harness();

    let mut request = ingest_request("u1");
    request.access_code = Some("TAX-2026-SECRET".to_string());
    h.service.ingest(request).await.unwrap();

    let retrieved = h
        .service
        .retrieve_by_code("TAX-2026-SECRET", RetrieveOptions::default())
        .await
        .unwrap();
    assert_eq!(retrieved.plaintext, b"hello government");

    let err = h
        .service
        .retrieve_by_code("WRONG-CODE", RetrieveOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));
}

#[tokio::test]
async fn test_status_transitions() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    let officer = Requester::officer("off-1", "Revenue Department");

    // Citizens may not verify
    let err = h
        .service
        .set_status(
            receipt.document_id,
            DocumentStatus::Approved,
            &Requester::citizen("u1"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));

    let updated = h
        .service
        .set_status(
            receipt.document_id,
            DocumentStatus::Approved,
            &officer,
            Some("All supporting papers in order"),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, DocumentStatus::Approved);
    assert_eq!(updated.verified_by.as_deref(), Some("off-1"));

    // Terminal states reject further transitions
    let err = h
        .service
        .set_status(receipt.document_id, DocumentStatus::Rejected, &officer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_grant_is_idempotent() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    let owner = Requester::citizen("u1");

    let first = h
        .service
        .grant_department_access(
            receipt.document_id,
            "transport",
            AccessPolicy::View,
            &owner,
        )
        .await
        .unwrap();
    assert_eq!(first.shared_departments.len(), 1);
    assert_eq!(first.shared_departments[0].access_policy, AccessPolicy::View);

    let second = h
        .service
        .grant_department_access(
            receipt.document_id,
            "transport",
            AccessPolicy::Verify,
            &owner,
        )
        .await
        .unwrap();
    assert_eq!(second.shared_departments.len(), 1);
    assert_eq!(
        second.shared_departments[0].access_policy,
        AccessPolicy::Verify
    );
}

#[tokio::test]
async fn test_grant_requires_owner_or_privileged() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();

    let err = h
        .service
        .grant_department_access(
            receipt.document_id,
            "transport",
            AccessPolicy::View,
            &Requester::citizen("u2"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));
}

#[tokio::test]
async fn test_attach_application_is_one_shot() {
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    let owner = Requester::citizen("u1");
    let application_id = Uuid::new_v4();

    let updated = h
        .service
        .attach_application(receipt.document_id, application_id, &owner)
        .await
        .unwrap();
    assert_eq!(updated.application_id, Some(application_id));

    let err = h
        .service
        .attach_application(receipt.document_id, Uuid::new_v4(), &owner)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_verify_anchor_states() {
    // Anchored and matching
    let h = harness();
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    let verification = h
        .service
        .verify_anchor(receipt.document_id, &Requester::citizen("u1"))
        .await
        .unwrap();
    assert_eq!(
        verification,
        AnchorVerification::Verified {
            tx_hash: "0xabc123".to_string()
        }
    );

    // Never anchored (ledger was down at ingest)
    let h = harness_with(Some(Arc::new(FailingLedger)), None);
    let receipt = h.service.ingest(ingest_request("u1")).await.unwrap();
    let verification = h
        .service
        .verify_anchor(receipt.document_id, &Requester::citizen("u1"))
        .await
        .unwrap();
    assert_eq!(verification, AnchorVerification::NotAnchored);
}

#[tokio::test]
async fn test_not_found_document() {
    let h = harness();
    let err = h
        .service
        .retrieve(
            Uuid::new_v4(),
            &Requester::citizen("u1"),
            RetrieveOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
