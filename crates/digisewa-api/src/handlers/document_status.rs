use crate::auth::RequesterContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use digisewa_core::models::{DocumentResponse, DocumentStatus};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: DocumentStatus,
    pub remarks: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/api/v0/documents/{id}/status",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document id")
    ),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status updated", body = DocumentResponse),
        (status = 403, description = "Requester may not verify documents", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Illegal status transition", body = ErrorResponse)
    )
)]
pub async fn set_document_status(
    State(state): State<Arc<AppState>>,
    ctx: RequesterContext,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<StatusUpdateRequest>,
) -> Result<Json<DocumentResponse>, HttpAppError> {
    let record = state
        .custody
        .set_status(id, body.status, &ctx.requester, body.remarks.as_deref())
        .await?;
    Ok(Json(DocumentResponse::from(record)))
}
