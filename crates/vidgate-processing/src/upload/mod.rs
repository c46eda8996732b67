//! Ingestion handler: fetch → collect → validate → post-process (or delete).

pub mod handler;
pub mod post_process;

pub use handler::IngestionHandler;
pub use post_process::{relocated_key, PostProcess, PROCESSED_PREFIXES};
