//! DigiSewa Custody Library
//!
//! The document custody orchestrator and access gate. This crate composes
//! the cipher unit, content hasher, content store, ledger anchor, and
//! persistence seams into the ingest/retrieve/verify/share operations the
//! HTTP layer exposes.

pub mod gate;
pub mod service;
pub mod testkit;

pub use gate::{AccessDecision, AccessGate};
pub use service::{
    AnchorVerification, CustodyService, IngestRequest, RetrieveOptions, RetrievedDocument,
};
