//! Vidgate Core Library
//!
//! This crate provides the domain models, error type and configuration shared by
//! every Vidgate component: upload events, media classes and their policies,
//! validation outcomes and the handler response contract.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{IngestConfig, StorageConfig};
pub use error::{IngestError, IngestResult, LogLevel};
pub use models::{
    claimed_extension_of, HandlerResponse, MediaClass, MediaClassConfig, RejectReason,
    UploadEvent, UploadRecord, ValidationOutcome,
};
pub use storage_types::StorageBackend;
