//! Database repositories for the custody data access layer.
//!
//! Each repository owns one domain entity and provides the atomic statements
//! the orchestrator relies on: the single-insert create, the guarded status
//! update, and the grant upsert.

pub mod audit;
pub mod documents;
