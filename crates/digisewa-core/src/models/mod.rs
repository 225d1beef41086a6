//! Domain models shared across DigiSewa components.

pub mod audit;
pub mod document;
pub mod requester;

pub use audit::{AccessAuditEvent, NewAccessAuditEvent};
pub use document::{
    AccessGrant, AccessPolicy, DocumentRecord, DocumentResponse, DocumentStatus, IngestReceipt,
    NewDocument,
};
pub use requester::{Requester, Role};
