//! Access gate: who may fetch a document's plaintext.
//!
//! Two independent authorization strategies with different trust
//! assumptions. The identity path: owners see their own documents,
//! privileged roles (officer, admin, department) see everything but every
//! such access lands in the audit trail. The possession-of-secret path:
//! a supplied access code is hashed and compared against the stored hash.
//! Neither path ever returns key material alongside a denial.

use std::sync::Arc;

use digisewa_core::hashing;
use digisewa_core::models::{DocumentRecord, NewAccessAuditEvent, Requester, Role};
use digisewa_core::{AppError, AuditEvents};

/// How a retrieval was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Owner,
    Privileged(Role),
    AccessCode,
}

pub struct AccessGate {
    audit: Arc<dyn AuditEvents>,
}

impl AccessGate {
    pub fn new(audit: Arc<dyn AuditEvents>) -> Self {
        AccessGate { audit }
    }

    /// Identity-based authorization. Privileged access is permitted but
    /// audited; the audit write must succeed before the access is granted.
    pub async fn authorize(
        &self,
        requester: &Requester,
        document: &DocumentRecord,
    ) -> Result<AccessDecision, AppError> {
        if requester.id == document.owner_id {
            return Ok(AccessDecision::Owner);
        }

        if requester.role.is_privileged() {
            self.audit
                .record_access(NewAccessAuditEvent {
                    document_id: document.id,
                    accessed_by: requester.id.clone(),
                    role: requester.role,
                })
                .await?;
            tracing::info!(
                document_id = %document.id,
                accessed_by = %requester.id,
                role = %requester.role,
                "Privileged document access"
            );
            return Ok(AccessDecision::Privileged(requester.role));
        }

        tracing::warn!(
            document_id = %document.id,
            requester_id = %requester.id,
            "Document access denied"
        );
        Err(AppError::AccessDenied(format!(
            "Requester {} may not access document {}",
            requester.id, document.id
        )))
    }

    /// Possession-of-secret authorization: hash the supplied code and
    /// compare in constant time against the stored hash.
    pub fn authorize_by_code(
        &self,
        access_code: &str,
        document: &DocumentRecord,
    ) -> Result<AccessDecision, AppError> {
        let supplied = hashing::digest_access_code(access_code);
        match document.access_code_hash {
            Some(ref stored) if hashing::digests_match(stored, &supplied) => {
                Ok(AccessDecision::AccessCode)
            }
            _ => Err(AppError::AccessDenied(format!(
                "Access code does not match document {}",
                document.id
            ))),
        }
    }
}
