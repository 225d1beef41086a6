//! Document repository: custody records and department grants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use digisewa_core::crypto::{EncryptionKey, Iv};
use digisewa_core::models::{AccessGrant, AccessPolicy, DocumentRecord, DocumentStatus, NewDocument};
use digisewa_core::{AppError, DocumentRecords};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "id, owner_id, application_id, original_name, mime_type, \
     byte_size, content_digest, content_address, encryption_key, iv, ledger_tx_hash, status, \
     department_label, access_code_hash, verified_by, verification_remarks, uploaded_at, updated_at";

/// Row type for the documents table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub owner_id: String,
    pub application_id: Option<Uuid>,
    pub original_name: String,
    pub mime_type: String,
    pub byte_size: i64,
    pub content_digest: String,
    pub content_address: String,
    pub encryption_key: String,
    pub iv: String,
    pub ledger_tx_hash: Option<String>,
    pub status: DocumentStatus,
    pub department_label: String,
    pub access_code_hash: Option<String>,
    pub verified_by: Option<String>,
    pub verification_remarks: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_record(self, shared_departments: Vec<AccessGrant>) -> DocumentRecord {
        DocumentRecord {
            id: self.id,
            owner_id: self.owner_id,
            application_id: self.application_id,
            original_name: self.original_name,
            mime_type: self.mime_type,
            byte_size: self.byte_size,
            content_digest: self.content_digest,
            content_address: self.content_address,
            encryption_key: EncryptionKey::from_base64(self.encryption_key),
            iv: Iv::from_base64(self.iv),
            ledger_tx_hash: self.ledger_tx_hash,
            status: self.status,
            department_label: self.department_label,
            access_code_hash: self.access_code_hash,
            shared_departments,
            verified_by: self.verified_by,
            verification_remarks: self.verification_remarks,
            uploaded_at: self.uploaded_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row type for the document_access_grants table.
#[derive(Debug, sqlx::FromRow)]
pub struct GrantRow {
    pub department_id: String,
    pub access_policy: AccessPolicy,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
}

impl GrantRow {
    fn into_grant(self) -> AccessGrant {
        AccessGrant {
            department_id: self.department_id,
            access_policy: self.access_policy,
            granted_by: self.granted_by,
            granted_at: self.granted_at,
        }
    }
}

/// Repository for the documents and document_access_grants tables.
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn grants_for(&self, document_id: Uuid) -> Result<Vec<AccessGrant>, AppError> {
        let rows: Vec<GrantRow> = sqlx::query_as::<Postgres, GrantRow>(
            r#"
            SELECT department_id, access_policy, granted_by, granted_at
            FROM document_access_grants
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GrantRow::into_grant).collect())
    }

    async fn assemble(&self, row: Option<DocumentRow>) -> Result<Option<DocumentRecord>, AppError> {
        match row {
            Some(row) => {
                let grants = self.grants_for(row.id).await?;
                Ok(Some(row.into_record(grants)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentRecords for PgDocumentRepository {
    /// The full custody bundle (address, key, IV, digest) lands in one
    /// INSERT; a reader can never observe a partial record.
    #[tracing::instrument(skip(self, doc), fields(db.table = "documents", owner_id = %doc.owner_id))]
    async fn create(&self, doc: NewDocument) -> Result<DocumentRecord, AppError> {
        let row: DocumentRow = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            INSERT INTO documents (
                id, owner_id, application_id, original_name, mime_type, byte_size,
                content_digest, content_address, encryption_key, iv,
                ledger_tx_hash, department_label, access_code_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(doc.id)
        .bind(&doc.owner_id)
        .bind(doc.application_id)
        .bind(&doc.original_name)
        .bind(&doc.mime_type)
        .bind(doc.byte_size)
        .bind(&doc.content_digest)
        .bind(&doc.content_address)
        .bind(doc.encryption_key.as_base64())
        .bind(doc.iv.as_base64())
        .bind(&doc.ledger_tx_hash)
        .bind(&doc.department_label)
        .bind(&doc.access_code_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_record(vec![]))
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<DocumentRecord>, AppError> {
        let row: Option<DocumentRow> = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.assemble(row).await
    }

    #[tracing::instrument(skip(self, code_hash), fields(db.table = "documents"))]
    async fn find_by_access_code_hash(
        &self,
        code_hash: &str,
    ) -> Result<Option<DocumentRecord>, AppError> {
        let row: Option<DocumentRow> = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE access_code_hash = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(code_hash)
        .fetch_optional(&self.pool)
        .await?;
        self.assemble(row).await
    }

    /// Single guarded UPDATE: the source-state predicate makes concurrent
    /// verifier decisions race-safe without a read-modify-write.
    #[tracing::instrument(skip(self, remarks), fields(db.table = "documents", db.record_id = %id, next = %next))]
    async fn set_status(
        &self,
        id: Uuid,
        next: DocumentStatus,
        verifier_id: &str,
        remarks: Option<&str>,
    ) -> Result<DocumentRecord, AppError> {
        let row: Option<DocumentRow> = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            UPDATE documents
            SET status = $2, verified_by = $3, verification_remarks = $4, updated_at = now()
            WHERE id = $1 AND status IN ('uploaded', 'pending_verification')
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(next)
        .bind(verifier_id)
        .bind(remarks)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let grants = self.grants_for(row.id).await?;
                Ok(row.into_record(grants))
            }
            None => match self.get(id).await? {
                Some(existing) => Err(AppError::InvalidTransition {
                    from: existing.status.to_string(),
                    to: next.to_string(),
                }),
                None => Err(AppError::NotFound(format!("Document {} not found", id))),
            },
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.record_id = %id))]
    async fn attach_application(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> Result<DocumentRecord, AppError> {
        let row: Option<DocumentRow> = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            UPDATE documents
            SET application_id = $2, updated_at = now()
            WHERE id = $1 AND application_id IS NULL
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let grants = self.grants_for(row.id).await?;
                Ok(row.into_record(grants))
            }
            None => match self.get(id).await? {
                Some(_) => Err(AppError::Validation(format!(
                    "Document {} is already linked to an application",
                    id
                ))),
                None => Err(AppError::NotFound(format!("Document {} not found", id))),
            },
        }
    }

    /// Upsert keyed on (document_id, department_id): re-granting refreshes
    /// policy and timestamp instead of duplicating the grant.
    #[tracing::instrument(skip(self, grant), fields(db.table = "document_access_grants", db.record_id = %id, department = %grant.department_id))]
    async fn grant_department_access(
        &self,
        id: Uuid,
        grant: AccessGrant,
    ) -> Result<DocumentRecord, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO document_access_grants
                (document_id, department_id, access_policy, granted_by, granted_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (document_id, department_id)
            DO UPDATE SET
                access_policy = EXCLUDED.access_policy,
                granted_by = EXCLUDED.granted_by,
                granted_at = now()
            "#,
        )
        .bind(id)
        .bind(&grant.department_id)
        .bind(grant.access_policy)
        .bind(&grant.granted_by)
        .execute(&self.pool)
        .await;

        if let Err(sqlx::Error::Database(ref db_err)) = result {
            // 23503: the document the grant points at does not exist
            if db_err.code().as_deref() == Some("23503") {
                return Err(AppError::NotFound(format!("Document {} not found", id)));
            }
        }
        result?;

        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }
}
