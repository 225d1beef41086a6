use crate::auth::RequesterContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use digisewa_core::models::IngestReceipt;
use digisewa_core::AppError;
use digisewa_custody::IngestRequest;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Application this document supports, if it already exists.
    pub application_id: Option<Uuid>,
}

struct UploadForm {
    data: Vec<u8>,
    original_name: String,
    mime_type: String,
    department: Option<String>,
    access_code: Option<String>,
}

/// Pull the file and the optional text fields out of the multipart body.
async fn extract_upload(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<(Vec<u8>, String, String)> = None;
    let mut department = None;
    let mut access_code = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let original_name = field
                    .file_name()
                    .unwrap_or("document")
                    .to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?;
                file = Some((data.to_vec(), original_name, mime_type));
            }
            Some("department") => {
                department = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Invalid department field: {}", e)))?,
                );
            }
            Some("access_code") => {
                access_code = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Invalid access_code field: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let (data, original_name, mime_type) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    Ok(UploadForm {
        data,
        original_name,
        mime_type,
        department,
        access_code,
    })
}

#[utoipa::path(
    post,
    path = "/api/v0/documents",
    tag = "documents",
    params(
        ("application_id" = Option<Uuid>, Query, description = "Application to link the document to")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document ingested", body = IngestReceipt),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    ctx: RequesterContext,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Json<IngestReceipt>, HttpAppError> {
    let form = extract_upload(multipart).await?;

    let department_label = form
        .department
        .or_else(|| ctx.requester.department.clone())
        .unwrap_or_default();

    let receipt = state
        .custody
        .ingest(IngestRequest {
            plaintext: form.data,
            original_name: form.original_name,
            mime_type: form.mime_type,
            owner_id: ctx.requester.id,
            department_label,
            application_id: query.application_id,
            access_code: form.access_code,
        })
        .await?;

    Ok(Json(receipt))
}
