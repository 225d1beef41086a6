//! HTTP handlers for the custody API.

pub mod document_anchor;
pub mod document_download;
pub mod document_get;
pub mod document_grants;
pub mod document_status;
pub mod document_upload;
