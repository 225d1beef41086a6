use crate::auth::RequesterContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use digisewa_custody::AnchorVerification;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct AnchorResponse {
    /// One of: not_anchored, verified, mismatch, unavailable
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl From<AnchorVerification> for AnchorResponse {
    fn from(v: AnchorVerification) -> Self {
        match v {
            AnchorVerification::NotAnchored => AnchorResponse {
                state: "not_anchored",
                tx_hash: None,
            },
            AnchorVerification::Verified { tx_hash } => AnchorResponse {
                state: "verified",
                tx_hash: Some(tx_hash),
            },
            AnchorVerification::Mismatch { tx_hash } => AnchorResponse {
                state: "mismatch",
                tx_hash: Some(tx_hash),
            },
            AnchorVerification::Unavailable => AnchorResponse {
                state: "unavailable",
                tx_hash: None,
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/documents/{id}/anchor",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Ledger anchor state for display", body = AnchorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_document_anchor(
    State(state): State<Arc<AppState>>,
    ctx: RequesterContext,
    Path(id): Path<Uuid>,
) -> Result<Json<AnchorResponse>, HttpAppError> {
    let verification = state.custody.verify_anchor(id, &ctx.requester).await?;
    Ok(Json(AnchorResponse::from(verification)))
}
