//! In-memory storage backend
//!
//! Keeps objects in a process-local map. Used by tests and dry runs; supports failure
//! injection so handler error paths can be exercised without a real object store.

use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Chunk size used when replaying a stored body as a stream.
const CHUNK_SIZE: usize = 8192;

#[derive(Clone, Debug)]
struct MemoryObject {
    data: Vec<u8>,
    content_type: String,
    /// Length reported on fetch; defaults to the real length.
    declared_length: u64,
    /// Body stream fails after the first chunk.
    broken: bool,
}

#[derive(Default)]
struct State {
    objects: HashMap<(String, String), MemoryObject>,
    fail_deletes: HashSet<(String, String)>,
    fail_puts: bool,
    deletes: usize,
}

/// Storage implementation that keeps objects in memory
#[derive(Default)]
pub struct InMemoryStorage {
    state: Mutex<State>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store an object directly, bypassing the trait
    pub fn insert(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str) {
        let declared_length = data.len() as u64;
        self.insert_with_declared_length(bucket, key, data, content_type, declared_length);
    }

    /// Store an object whose reported content length differs from its body
    pub fn insert_with_declared_length(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        declared_length: u64,
    ) {
        self.state().objects.insert(
            (bucket.to_string(), key.to_string()),
            MemoryObject {
                data,
                content_type: content_type.to_string(),
                declared_length,
                broken: false,
            },
        );
    }

    /// Store an object whose body stream errors mid-read
    pub fn insert_broken(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str) {
        let declared_length = data.len() as u64;
        self.state().objects.insert(
            (bucket.to_string(), key.to_string()),
            MemoryObject {
                data,
                content_type: content_type.to_string(),
                declared_length,
                broken: true,
            },
        );
    }

    /// Make deletes of this object fail
    pub fn fail_delete(&self, bucket: &str, key: &str) {
        self.state()
            .fail_deletes
            .insert((bucket.to_string(), key.to_string()));
    }

    /// Make every put fail
    pub fn fail_puts(&self, fail: bool) {
        self.state().fail_puts = fail;
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.state()
            .objects
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    /// Get object data and content type (for test assertions)
    pub fn get(&self, bucket: &str, key: &str) -> Option<(Vec<u8>, String)> {
        self.state()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| (o.data.clone(), o.content_type.clone()))
    }

    /// Keys currently stored in a bucket, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Number of successful deletes
    pub fn delete_count(&self) -> usize {
        self.state().deletes
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        let object = self
            .state()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", bucket, key)))?;

        let mut chunks: Vec<Result<Bytes, StorageError>> = object
            .data
            .chunks(CHUNK_SIZE)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        if object.broken {
            chunks.truncate(1);
            chunks.push(Err(StorageError::DownloadFailed(
                "connection reset".to_string(),
            )));
        }

        let body: ByteStream = Box::pin(stream::iter(chunks));

        Ok(StoredObject {
            body,
            content_length: object.declared_length,
            content_type: Some(object.content_type),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.state().fail_puts {
            return Err(StorageError::UploadFailed(format!(
                "put rejected for {}/{}",
                bucket, key
            )));
        }
        self.insert(bucket, key, data, content_type);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let id = (bucket.to_string(), key.to_string());
        let mut state = self.state();
        if state.fail_deletes.contains(&id) {
            return Err(StorageError::AccessDenied(format!("{}/{}", bucket, key)));
        }
        state.objects.remove(&id);
        state.deletes += 1;
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        Ok(self.contains(bucket, key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_body_is_replayed_in_chunks() {
        let storage = InMemoryStorage::new();
        let data = vec![7u8; CHUNK_SIZE * 2 + 1];
        storage.insert("b", "k.mp4", data.clone(), "video/mp4");

        let object = storage.get_object("b", "k.mp4").await.unwrap();
        assert_eq!(object.content_length, data.len() as u64);

        let chunks: Vec<_> = object.body.collect().await;
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.is_ok()));
    }

    #[tokio::test]
    async fn test_broken_body_errors() {
        let storage = InMemoryStorage::new();
        storage.insert_broken("b", "k.mp4", vec![1u8; 10], "video/mp4");

        let object = storage.get_object("b", "k.mp4").await.unwrap();
        let chunks: Vec<_> = object.body.collect().await;
        assert!(chunks.last().unwrap().is_err());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_object() {
        let storage = InMemoryStorage::new();
        storage.insert("b", "k.jpg", vec![1, 2, 3], "image/jpeg");
        storage.fail_delete("b", "k.jpg");

        assert!(matches!(
            storage.delete_object("b", "k.jpg").await,
            Err(StorageError::AccessDenied(_))
        ));
        assert!(storage.contains("b", "k.jpg"));
        assert_eq!(storage.delete_count(), 0);
    }
}
