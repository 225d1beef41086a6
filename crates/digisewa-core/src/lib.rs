//! DigiSewa Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! pure custody primitives (cipher unit, content hasher) shared across all
//! DigiSewa components.

pub mod config;
pub mod crypto;
pub mod error;
pub mod hashing;
pub mod models;
pub mod records;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, CustodyConfig, LedgerSettings, StorageBackend};
pub use crypto::{DocumentCipher, EncryptionKey, Iv};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use records::{AuditEvents, DocumentRecords};
