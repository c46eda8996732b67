//! Vidgate Storage Library
//!
//! This crate provides the object store abstraction used by the ingestion handlers,
//! with implementations for S3 (and S3-compatible services), the local filesystem and
//! an in-process map.
//!
//! # Addressing
//!
//! Objects are addressed by `(bucket, key)` exactly as they appear in upload
//! notifications. Keys must not contain `..` or a leading `/` on the local backend.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::InMemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
pub use vidgate_core::StorageBackend;
