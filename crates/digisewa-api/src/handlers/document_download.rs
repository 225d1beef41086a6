use crate::auth::RequesterContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Response, StatusCode};
use digisewa_core::AppError;
use digisewa_custody::{RetrieveOptions, RetrievedDocument};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Recompute the plaintext digest and compare to the stored one.
    #[serde(default)]
    pub verify: bool,
}

#[derive(Debug, Deserialize)]
pub struct SharedDownloadQuery {
    pub access_code: String,
    #[serde(default)]
    pub verify: bool,
}

fn plaintext_response(doc: RetrievedDocument) -> Result<Response<Body>, HttpAppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, doc.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", doc.original_name),
        )
        .body(Body::from(doc.plaintext))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}

#[utoipa::path(
    get,
    path = "/api/v0/documents/{id}/content",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document id"),
        ("verify" = Option<bool>, Query, description = "Verify content digest after decryption")
    ),
    responses(
        (status = 200, description = "Decrypted document content"),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Integrity mismatch", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    ctx: RequesterContext,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response<Body>, HttpAppError> {
    let doc = state
        .custody
        .retrieve(
            id,
            &ctx.requester,
            RetrieveOptions {
                verify_integrity: query.verify,
            },
        )
        .await?;

    plaintext_response(doc)
}

/// Possession-of-secret download: no bearer token, the access code is the
/// credential.
#[utoipa::path(
    get,
    path = "/api/v0/documents/shared",
    tag = "documents",
    params(
        ("access_code" = String, Query, description = "Share secret handed out by the owner"),
        ("verify" = Option<bool>, Query, description = "Verify content digest after decryption")
    ),
    responses(
        (status = 200, description = "Decrypted document content"),
        (status = 403, description = "Access code does not match", body = ErrorResponse)
    )
)]
pub async fn download_shared_document(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SharedDownloadQuery>,
) -> Result<Response<Body>, HttpAppError> {
    let doc = state
        .custody
        .retrieve_by_code(
            &query.access_code,
            RetrieveOptions {
                verify_integrity: query.verify,
            },
        )
        .await?;

    plaintext_response(doc)
}
