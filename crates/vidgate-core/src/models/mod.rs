//! Domain models for the ingestion pipeline.

pub mod event;
pub mod media_class;
pub mod outcome;

pub use event::{claimed_extension_of, UploadEvent, UploadRecord};
pub use media_class::{MediaClass, MediaClassConfig};
pub use outcome::{HandlerResponse, RejectReason, ValidationOutcome};
