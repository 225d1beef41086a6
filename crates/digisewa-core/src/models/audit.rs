use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::requester::Role;

/// One privileged access to a document: who fetched it, in what role, when.
/// Owner reads are not audited; privileged reads always are.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessAuditEvent {
    pub id: Uuid,
    pub document_id: Uuid,
    pub accessed_by: String,
    pub role: Role,
    pub accessed_at: DateTime<Utc>,
}

/// Audit event before persistence (id and timestamp assigned by the store).
#[derive(Debug, Clone)]
pub struct NewAccessAuditEvent {
    pub document_id: Uuid,
    pub accessed_by: String,
    pub role: Role,
}
