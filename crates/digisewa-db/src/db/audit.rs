//! Audit log repository: append-only record of privileged document access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use digisewa_core::models::{AccessAuditEvent, NewAccessAuditEvent, Role};
use digisewa_core::{AppError, AuditEvents};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row type for the document_access_audit table.
#[derive(Debug, sqlx::FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub accessed_by: String,
    pub role: String,
    pub accessed_at: DateTime<Utc>,
}

impl AuditRow {
    fn into_event(self) -> Result<AccessAuditEvent, AppError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| AppError::Internal(format!("Unknown audit role: {}", self.role)))?;
        Ok(AccessAuditEvent {
            id: self.id,
            document_id: self.document_id,
            accessed_by: self.accessed_by,
            role,
            accessed_at: self.accessed_at,
        })
    }
}

/// Repository for the document_access_audit table.
#[derive(Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditEvents for PgAuditLog {
    #[tracing::instrument(skip(self, event), fields(db.table = "document_access_audit", document_id = %event.document_id))]
    async fn record_access(&self, event: NewAccessAuditEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO document_access_audit (document_id, accessed_by, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(event.document_id)
        .bind(&event.accessed_by)
        .bind(event.role.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_access_audit", document_id = %document_id))]
    async fn list_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<AccessAuditEvent>, AppError> {
        let rows: Vec<AuditRow> = sqlx::query_as::<Postgres, AuditRow>(
            r#"
            SELECT id, document_id, accessed_by, role, accessed_at
            FROM document_access_audit
            WHERE document_id = $1
            ORDER BY accessed_at
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditRow::into_event).collect()
    }
}
