//! Persistence seams for the custody orchestrator.
//!
//! The orchestrator never talks to a database directly; it goes through these
//! traits. `digisewa-db` provides the Postgres implementations, and the
//! custody test helpers provide in-memory ones.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    AccessAuditEvent, AccessGrant, DocumentRecord, DocumentStatus, NewAccessAuditEvent,
    NewDocument,
};
use crate::AppError;

/// Durable store of document custody records.
#[async_trait]
pub trait DocumentRecords: Send + Sync {
    /// Persist a fully-ingested document as one atomic write, under the id
    /// the ingest call minted; a half-written record must never become
    /// visible.
    async fn create(&self, doc: NewDocument) -> Result<DocumentRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<DocumentRecord>, AppError>;

    /// Lookup-by-secret path: the hash of a user-supplied access code.
    async fn find_by_access_code_hash(
        &self,
        code_hash: &str,
    ) -> Result<Option<DocumentRecord>, AppError>;

    /// Apply a verifier's status decision as a single atomic update, guarded
    /// on the legal source states. Returns `InvalidTransition` when the
    /// guard rejects the update for an existing document.
    async fn set_status(
        &self,
        id: Uuid,
        next: DocumentStatus,
        verifier_id: &str,
        remarks: Option<&str>,
    ) -> Result<DocumentRecord, AppError>;

    /// Link the document to an application, once. A second attempt on a
    /// document that already has one is a validation error.
    async fn attach_application(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> Result<DocumentRecord, AppError>;

    /// Upsert a department grant. Granting the same department twice must
    /// not duplicate the grant; the policy and timestamp are refreshed.
    async fn grant_department_access(
        &self,
        id: Uuid,
        grant: AccessGrant,
    ) -> Result<DocumentRecord, AppError>;
}

/// Append-only audit trail of privileged document access.
#[async_trait]
pub trait AuditEvents: Send + Sync {
    async fn record_access(&self, event: NewAccessAuditEvent) -> Result<(), AppError>;

    async fn list_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<AccessAuditEvent>, AppError>;
}
