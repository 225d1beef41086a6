use crate::auth::RequesterContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use digisewa_core::models::{AccessPolicy, DocumentResponse};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantRequest {
    pub department_id: String,
    pub access_policy: AccessPolicy,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachApplicationRequest {
    pub application_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v0/documents/{id}/grants",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document id")
    ),
    request_body = GrantRequest,
    responses(
        (status = 200, description = "Grant recorded (idempotent)", body = DocumentResponse),
        (status = 403, description = "Only the owner or a privileged role may share", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn grant_department_access(
    State(state): State<Arc<AppState>>,
    ctx: RequesterContext,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<GrantRequest>,
) -> Result<Json<DocumentResponse>, HttpAppError> {
    let record = state
        .custody
        .grant_department_access(id, &body.department_id, body.access_policy, &ctx.requester)
        .await?;
    Ok(Json(DocumentResponse::from(record)))
}

#[utoipa::path(
    post,
    path = "/api/v0/documents/{id}/application",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document id")
    ),
    request_body = AttachApplicationRequest,
    responses(
        (status = 200, description = "Application linked", body = DocumentResponse),
        (status = 400, description = "Already linked", body = ErrorResponse),
        (status = 403, description = "Only the owner may link", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn attach_application(
    State(state): State<Arc<AppState>>,
    ctx: RequesterContext,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<AttachApplicationRequest>,
) -> Result<Json<DocumentResponse>, HttpAppError> {
    let record = state
        .custody
        .attach_application(id, body.application_id, &ctx.requester)
        .await?;
    Ok(Json(DocumentResponse::from(record)))
}
