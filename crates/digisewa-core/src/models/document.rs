use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::crypto::{EncryptionKey, Iv};

/// Document lifecycle status. Verification actions are the only legal way to
/// leave `Uploaded`/`PendingVerification`; `Approved`/`Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "document_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    PendingVerification,
    Approved,
    Rejected,
}

impl DocumentStatus {
    /// Whether a verifier may move a document from `self` to `next`.
    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        matches!(
            (self, next),
            (
                DocumentStatus::Uploaded | DocumentStatus::PendingVerification,
                DocumentStatus::Approved | DocumentStatus::Rejected
            )
        )
    }
}

impl FromStr for DocumentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uploaded" => Ok(DocumentStatus::Uploaded),
            "pending_verification" => Ok(DocumentStatus::PendingVerification),
            "approved" => Ok(DocumentStatus::Approved),
            "rejected" => Ok(DocumentStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid document status: {}", s)),
        }
    }
}

impl Display for DocumentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DocumentStatus::Uploaded => write!(f, "uploaded"),
            DocumentStatus::PendingVerification => write!(f, "pending_verification"),
            DocumentStatus::Approved => write!(f, "approved"),
            DocumentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// What a department granted access may do with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "access_policy", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    View,
    Verify,
}

impl Display for AccessPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AccessPolicy::View => write!(f, "view"),
            AccessPolicy::Verify => write!(f, "verify"),
        }
    }
}

/// One department's permission on one document. Grants are append-only;
/// re-granting the same department updates policy and timestamp in place.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessGrant {
    pub department_id: String,
    pub access_policy: AccessPolicy,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
}

/// Custody metadata for one uploaded document.
///
/// `content_address`, `encryption_key`, and `iv` are written together in a
/// single atomic persist at ingest; a record with one but not the others is
/// invalid. The key and IV types redact themselves from `Debug` output, and
/// this struct deliberately does not implement `Serialize` - API-facing
/// shapes are `DocumentResponse` and `IngestReceipt`.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub application_id: Option<Uuid>,
    pub original_name: String,
    pub mime_type: String,
    pub byte_size: i64,
    pub content_digest: String,
    pub content_address: String,
    pub encryption_key: EncryptionKey,
    pub iv: Iv,
    pub ledger_tx_hash: Option<String>,
    pub status: DocumentStatus,
    pub department_label: String,
    pub access_code_hash: Option<String>,
    pub shared_departments: Vec<AccessGrant>,
    pub verified_by: Option<String>,
    pub verification_remarks: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Whether `department_id` currently holds a grant on this document.
    pub fn is_shared_with(&self, department_id: &str) -> bool {
        self.shared_departments
            .iter()
            .any(|g| g.department_id == department_id)
    }
}

/// Everything the repository needs to create a document record. The id is
/// minted at the start of ingest so the ledger anchor written in step 4 and
/// the record persisted in step 5 reference the same document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub owner_id: String,
    pub application_id: Option<Uuid>,
    pub original_name: String,
    pub mime_type: String,
    pub byte_size: i64,
    pub content_digest: String,
    pub content_address: String,
    pub encryption_key: EncryptionKey,
    pub iv: Iv,
    pub ledger_tx_hash: Option<String>,
    pub department_label: String,
    pub access_code_hash: Option<String>,
}

/// Returned to the upload caller. Carries no key material.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestReceipt {
    pub document_id: Uuid,
    pub content_address: String,
    pub content_digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_tx_hash: Option<String>,
}

/// Public view of a document record. Carries no key material.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<Uuid>,
    pub original_name: String,
    pub mime_type: String,
    pub byte_size: i64,
    pub content_digest: String,
    pub content_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_tx_hash: Option<String>,
    pub status: DocumentStatus,
    pub department_label: String,
    pub shared_departments: Vec<AccessGrant>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(doc: DocumentRecord) -> Self {
        DocumentResponse {
            id: doc.id,
            owner_id: doc.owner_id,
            application_id: doc.application_id,
            original_name: doc.original_name,
            mime_type: doc.mime_type,
            byte_size: doc.byte_size,
            content_digest: doc.content_digest,
            content_address: doc.content_address,
            ledger_tx_hash: doc.ledger_tx_hash,
            status: doc.status,
            department_label: doc.department_label,
            shared_departments: doc.shared_departments,
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DocumentCipher;

    fn test_record(status: DocumentStatus) -> DocumentRecord {
        let cipher = DocumentCipher::new();
        let key = cipher.generate_key();
        let (_, iv) = cipher.encrypt(b"payload", &key).unwrap();
        DocumentRecord {
            id: Uuid::new_v4(),
            owner_id: "u1".to_string(),
            application_id: None,
            original_name: "certificate.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            byte_size: 7,
            content_digest: crate::hashing::digest(b"payload"),
            content_address: "QmTestCid".to_string(),
            encryption_key: key,
            iv,
            ledger_tx_hash: None,
            status,
            department_label: "Revenue Department".to_string(),
            access_code_hash: None,
            shared_departments: vec![],
            verified_by: None,
            verification_remarks: None,
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_legal_transitions() {
        for from in [DocumentStatus::Uploaded, DocumentStatus::PendingVerification] {
            assert!(from.can_transition_to(DocumentStatus::Approved));
            assert!(from.can_transition_to(DocumentStatus::Rejected));
        }
    }

    #[test]
    fn test_illegal_transitions() {
        for from in [DocumentStatus::Approved, DocumentStatus::Rejected] {
            for to in [
                DocumentStatus::Uploaded,
                DocumentStatus::PendingVerification,
                DocumentStatus::Approved,
                DocumentStatus::Rejected,
            ] {
                assert!(!from.can_transition_to(to));
            }
        }
        assert!(!DocumentStatus::Uploaded.can_transition_to(DocumentStatus::PendingVerification));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            DocumentStatus::Uploaded,
            DocumentStatus::PendingVerification,
            DocumentStatus::Approved,
            DocumentStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<DocumentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_response_carries_no_key_material() {
        let record = test_record(DocumentStatus::Uploaded);
        let key = record.encryption_key.as_base64().to_string();
        let iv = record.iv.as_base64().to_string();

        let response = DocumentResponse::from(record);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains(&key));
        assert!(!json.contains(&iv));
        assert!(!json.contains("encryption_key"));
    }

    #[test]
    fn test_is_shared_with() {
        let mut record = test_record(DocumentStatus::Uploaded);
        assert!(!record.is_shared_with("transport"));
        record.shared_departments.push(AccessGrant {
            department_id: "transport".to_string(),
            access_policy: AccessPolicy::View,
            granted_by: "u1".to_string(),
            granted_at: Utc::now(),
        });
        assert!(record.is_shared_with("transport"));
    }
}
