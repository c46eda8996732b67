//! Vidgate Media Processing Library
//!
//! This crate validates uploaded media and runs class-specific post-processing:
//! - Signature matching against per-format magic bytes (signature)
//! - Size/type policy checks (validator)
//! - Body collection (collector)
//! - Image flattening to JPEG (flatten)
//! - The per-class ingestion handler (upload)

pub mod collector;
#[cfg(feature = "image")]
pub mod flatten;
pub mod signature;
pub mod upload;
pub mod validator;

// Re-export commonly used types
pub use collector::{collect, header_of, HEADER_LEN};
#[cfg(feature = "image")]
pub use flatten::{flatten_to_jpeg, TransformError, JPEG_QUALITY};
pub use signature::{detect_image_type, MatchRule, SignatureTable};
pub use upload::{relocated_key, IngestionHandler, PostProcess};
pub use validator::PolicyValidator;
