//! OpenAPI document for the custody API.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DigiSewa Custody API",
        description = "Encrypted document custody: upload, retrieval, verification, and department sharing"
    ),
    paths(
        crate::handlers::document_upload::upload_document,
        crate::handlers::document_get::get_document,
        crate::handlers::document_download::download_document,
        crate::handlers::document_download::download_shared_document,
        crate::handlers::document_status::set_document_status,
        crate::handlers::document_grants::grant_department_access,
        crate::handlers::document_grants::attach_application,
        crate::handlers::document_anchor::get_document_anchor,
    ),
    components(schemas(
        digisewa_core::models::IngestReceipt,
        digisewa_core::models::DocumentResponse,
        digisewa_core::models::DocumentStatus,
        digisewa_core::models::AccessPolicy,
        digisewa_core::models::AccessGrant,
        crate::handlers::document_status::StatusUpdateRequest,
        crate::handlers::document_grants::GrantRequest,
        crate::handlers::document_grants::AttachApplicationRequest,
        crate::handlers::document_anchor::AnchorResponse,
        crate::error::ErrorResponse,
    ))
)]
pub struct ApiDoc;
