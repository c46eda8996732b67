//! Error types module
//!
//! All failures of the ingestion pipeline are unified under [`IngestError`]. Rejections
//! (`PolicyViolation`, `SignatureMismatch`) are expected outcomes of validation and log
//! at debug level; everything else is an operational failure.

use crate::models::{MediaClass, RejectReason};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for non-fatal cleanup failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to fetch {bucket}/{key}: {message}")]
    Fetch {
        bucket: String,
        key: String,
        message: String,
    },

    /// Type or size rejected by the class policy.
    #[error("{} {}", .class.label(), .reason)]
    PolicyViolation {
        class: MediaClass,
        reason: RejectReason,
    },

    /// Content does not match the claimed type.
    #[error("{} {}", .class.label(), RejectReason::InvalidFileSignature)]
    SignatureMismatch { class: MediaClass },

    #[error("Stream read failed: {0}")]
    Io(String),

    #[error("Failed to delete {bucket}/{key}: {message}")]
    Delete {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Transform failed: {0}")]
    Transform(String),

    /// Aggregated failure of a batch; carries the first per-record failure.
    #[error("{} validation failed: {}", .class.label(), .source)]
    Batch {
        class: MediaClass,
        failed: usize,
        #[source]
        source: Box<IngestError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

impl IngestError {
    /// Build the rejection error matching a validation reason.
    pub fn rejected(class: MediaClass, reason: RejectReason) -> Self {
        match reason {
            RejectReason::InvalidFileSignature => IngestError::SignatureMismatch { class },
            reason => IngestError::PolicyViolation { class, reason },
        }
    }

    /// Whether this error is a validation rejection (as opposed to an operational failure).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            IngestError::PolicyViolation { .. } | IngestError::SignatureMismatch { .. }
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            IngestError::Fetch { .. } => "FETCH_ERROR",
            IngestError::PolicyViolation { .. } => "POLICY_VIOLATION",
            IngestError::SignatureMismatch { .. } => "SIGNATURE_MISMATCH",
            IngestError::Io(_) => "IO_ERROR",
            IngestError::Delete { .. } => "DELETE_ERROR",
            IngestError::Transform(_) => "TRANSFORM_ERROR",
            IngestError::Batch { .. } => "BATCH_FAILED",
            IngestError::Config(_) => "CONFIG_ERROR",
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            IngestError::PolicyViolation { .. } | IngestError::SignatureMismatch { .. } => {
                LogLevel::Debug
            }
            IngestError::Delete { .. } => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
