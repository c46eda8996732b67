use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}`. The declared content type is not
/// persisted, so fetched objects report none.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding one subdirectory per bucket
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert bucket and key to a filesystem path with security validation
    ///
    /// Rejects anything that could escape the bucket directory: empty segments,
    /// absolute keys and `..` components.
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
            return Err(StorageError::InvalidKey(format!(
                "Invalid bucket name: {}",
                bucket
            )));
        }

        if key.is_empty() || key.starts_with('/') || key.contains("..") {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(bucket).join(relative))
    }

    /// Whether a file exists at `path`. Only a missing file is `false`; any other
    /// filesystem error is reported.
    async fn path_exists(path: &Path) -> StorageResult<bool> {
        Ok(fs::try_exists(path).await?)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        let path = self.object_path(bucket, key)?;

        if !Self::path_exists(&path).await? {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        let content_length = file
            .metadata()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .len();

        let path_display = path.display().to_string();
        let body: ByteStream = Box::pin(tokio_util::io::ReaderStream::new(file).map(
            move |result| {
                result.map_err(|e| {
                    tracing::error!(
                        path = %path_display,
                        error = %e,
                        "Local storage stream read error"
                    );
                    StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
                })
            },
        ));

        tracing::debug!(
            path = %path.display(),
            size_bytes = content_length,
            "Local storage get successful"
        );

        Ok(StoredObject {
            body,
            content_length,
            content_type: None,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        let path = self.object_path(bucket, key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let path = self.object_path(bucket, key)?;
        let start = std::time::Instant::now();

        if !Self::path_exists(&path).await? {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let path = self.object_path(bucket, key)?;
        Self::path_exists(&path).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_object_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(storage.object_path("uploads", "../etc/passwd").is_err());
        assert!(storage.object_path("uploads", "/etc/passwd").is_err());
        assert!(storage.object_path("uploads", "./b.jpg").is_err());
        assert!(storage.object_path("up/loads", "a.jpg").is_err());
        assert!(storage.object_path("", "a.jpg").is_err());

        let path = storage
            .object_path("uploads", "landscape-images/a.jpg")
            .unwrap();
        assert!(path.starts_with(dir.path().join("uploads")));
    }

    #[tokio::test]
    async fn test_delete_missing_object_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(storage.delete_object("uploads", "missing.jpg").await.is_ok());
    }

    #[tokio::test]
    async fn test_filesystem_errors_are_not_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        storage
            .put_object("uploads", "a.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();

        // A regular file used as a directory component is an I/O error, not a miss.
        let key = "a.jpg/inner.jpg";
        assert!(matches!(
            storage.get_object("uploads", key).await,
            Err(StorageError::IoError(_))
        ));
        assert!(matches!(
            storage.delete_object("uploads", key).await,
            Err(StorageError::IoError(_))
        ));
        assert!(matches!(
            storage.exists("uploads", key).await,
            Err(StorageError::IoError(_))
        ));
        assert!(storage.exists("uploads", "a.jpg").await.unwrap());
    }
}
