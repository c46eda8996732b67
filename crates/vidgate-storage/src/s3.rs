use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// S3 storage implementation
///
/// Upload notifications name their bucket, so one bucket-scoped `AmazonS3` client is
/// built lazily per bucket and reused for the life of the process.
pub struct S3Storage {
    stores: RwLock<HashMap<String, AmazonS3>>,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(region: String, endpoint_url: Option<String>) -> Self {
        S3Storage {
            stores: RwLock::new(HashMap::new()),
            region,
            endpoint_url,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        {
            let stores = self
                .stores
                .read()
                .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?;
            if let Some(store) = stores.get(bucket) {
                return Ok(store.clone());
            }
        }

        let store = self.build_store(bucket)?;
        let mut stores = self
            .stores
            .write()
            .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?;
        let store = stores.entry(bucket.to_string()).or_insert(store).clone();

        tracing::debug!(bucket = %bucket, region = %self.region, "S3 client created");

        Ok(store)
    }
}

fn map_read_error(bucket: &str, key: &str, e: ObjectStoreError) -> StorageError {
    match e {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(format!("{}/{}", bucket, key)),
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            StorageError::AccessDenied(format!("{}/{}", bucket, key))
        }
        other => StorageError::DownloadFailed(other.to_string()),
    }
}

#[async_trait]
impl Storage for S3Storage {
    #[tracing::instrument(skip(self), fields(
        aws.service.name = "s3",
        aws.s3.operation = "GetObject",
        s3.bucket = %bucket,
        s3.key = %key
    ))]
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        let start = std::time::Instant::now();
        let store = self.store_for(bucket)?;
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| {
            let err = map_read_error(bucket, key, e);
            tracing::error!(
                error = %err,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 get failed"
            );
            err
        })?;

        let content_length = result.meta.size;
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v: &AttributeValue| {
                let value: &str = v.as_ref();
                value.to_string()
            });

        tracing::info!(
            size_bytes = content_length,
            content_type = ?content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 get successful"
        );

        let bucket = bucket.to_string();
        let key = key.to_string();
        let body: ByteStream = Box::pin(result.into_stream().map(move |res| {
            res.map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    "S3 stream download error"
                );
                StorageError::DownloadFailed(e.to_string())
            })
        }));

        Ok(StoredObject {
            body,
            content_length,
            content_type,
        })
    }

    #[tracing::instrument(skip(self, data), fields(
        aws.service.name = "s3",
        aws.s3.operation = "PutObject",
        s3.bucket = %bucket,
        s3.key = %key,
        s3.size = %data.len()
    ))]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let store = self.store_for(bucket)?;
        let size = data.len() as u64;
        let location = Path::from(key.to_string());

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );

        let result: ObjectResult<_> = store
            .put_opts(
                &location,
                PutPayload::from(data),
                PutOptions::from(attributes),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 put failed"
            );
            match e {
                ObjectStoreError::PermissionDenied { .. } => {
                    StorageError::AccessDenied(format!("{}/{}", bucket, key))
                }
                other => StorageError::UploadFailed(other.to_string()),
            }
        })?;

        tracing::info!(
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(
        aws.service.name = "s3",
        aws.s3.operation = "DeleteObject",
        s3.bucket = %bucket,
        s3.key = %key
    ))]
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let store = self.store_for(bucket)?;
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            match e {
                ObjectStoreError::NotFound { .. } => {
                    StorageError::NotFound(format!("{}/{}", bucket, key))
                }
                ObjectStoreError::PermissionDenied { .. } => {
                    StorageError::AccessDenied(format!("{}/{}", bucket, key))
                }
                other => StorageError::DeleteFailed(other.to_string()),
            }
        })?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let store = self.store_for(bucket)?;
        let location = Path::from(key.to_string());
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
