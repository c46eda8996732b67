//! Per-class ingestion handler.
//!
//! One handler instance serves one media class. Every record of an upload event is
//! processed concurrently on the calling task (join-all, no cancellation); the batch
//! succeeds only if every record does.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use vidgate_core::{
    HandlerResponse, IngestError, IngestResult, LogLevel, MediaClass, MediaClassConfig,
    UploadEvent, UploadRecord, ValidationOutcome,
};
use vidgate_storage::Storage;

#[cfg(feature = "image")]
use super::post_process::relocated_key;
use super::post_process::PostProcess;
use crate::collector::{collect, header_of};
use crate::validator::PolicyValidator;

/// Content type of flattened images.
#[cfg(feature = "image")]
const JPEG_CONTENT_TYPE: &str = "image/jpeg";

pub struct IngestionHandler {
    validator: PolicyValidator,
    post_process: PostProcess,
    storage: Arc<dyn Storage>,
}

impl IngestionHandler {
    /// Handler for `class` with the class's default post-processing.
    pub fn new(class: MediaClass, config: MediaClassConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            validator: PolicyValidator::new(class, config),
            post_process: PostProcess::for_class(class),
            storage,
        }
    }

    pub fn with_post_process(mut self, post_process: PostProcess) -> Self {
        self.post_process = post_process;
        self
    }

    pub fn class(&self) -> MediaClass {
        self.validator.class()
    }

    pub fn validator(&self) -> &PolicyValidator {
        &self.validator
    }

    /// Process every record of an upload event.
    ///
    /// On failure the error carries the first failing record (in event order); all
    /// failures are logged. Per-record side effects (deletes, relocations) of other
    /// records are not rolled back.
    #[tracing::instrument(skip(self, event), fields(class = %self.class(), records = event.len()))]
    pub async fn handle(&self, event: &UploadEvent) -> IngestResult<HandlerResponse> {
        let start = Instant::now();
        let class = self.class();

        let results = join_all(event.records.iter().map(|r| self.process_record(r))).await;

        let mut failures = Vec::new();
        for (record, result) in event.records.iter().zip(results) {
            if let Err(e) = result {
                log_failure(record, &e);
                failures.push(e);
            }
        }

        let failed = failures.len();
        if let Some(first) = failures.into_iter().next() {
            tracing::error!(
                failed,
                total = event.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload batch failed"
            );
            return Err(IngestError::Batch {
                class,
                failed,
                source: Box::new(first),
            });
        }

        tracing::info!(
            processed = event.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload batch validated"
        );

        Ok(HandlerResponse::ok(class.success_message(), event.len()))
    }

    /// Fetch, validate and post-process one uploaded object.
    pub async fn process_record(&self, record: &UploadRecord) -> IngestResult<()> {
        let bucket = record.bucket_name.as_str();
        let key = record.object_key.as_str();
        let class = self.class();

        let object = self
            .storage
            .get_object(bucket, key)
            .await
            .map_err(|e| IngestError::Fetch {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let claimed_extension = record.claimed_extension();
        let declared_size = object.content_length;
        let declared_type = object.content_type.clone();

        let data = collect(object.body, Some(declared_size)).await?;

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            extension = %claimed_extension,
            declared_size,
            declared_type = ?declared_type,
            collected_size = data.len(),
            "Upload collected"
        );

        let outcome = self
            .validator
            .validate(declared_size, &claimed_extension, header_of(&data));

        if let ValidationOutcome::Rejected(reason) = outcome {
            tracing::info!(
                bucket = %bucket,
                key = %key,
                reason = %reason,
                "Upload rejected"
            );
            self.delete_rejected(bucket, key).await;
            return Err(IngestError::rejected(class, reason));
        }

        match self.post_process {
            PostProcess::Identity => {
                tracing::info!(
                    bucket = %bucket,
                    key = %key,
                    size_bytes = declared_size,
                    "Upload accepted, retained for transcoding"
                );
            }
            PostProcess::ReencodeAndRelocate => {
                self.reencode_and_relocate(bucket, key, data).await?;
            }
        }

        Ok(())
    }

    /// Best-effort removal of a rejected upload. Failures are logged only.
    async fn delete_rejected(&self, bucket: &str, key: &str) {
        if let Err(e) = self.storage.delete_object(bucket, key).await {
            let err = IngestError::Delete {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            };
            tracing::warn!(error = %err, "Failed to delete rejected upload");
        }
    }

    #[cfg(feature = "image")]
    async fn reencode_and_relocate(&self, bucket: &str, key: &str, data: Vec<u8>) -> IngestResult<()> {
        let destination = relocated_key(key).ok_or_else(|| {
            IngestError::Transform(format!("No processed prefix for key {}", key))
        })?;

        let start = Instant::now();
        let jpeg = tokio::task::spawn_blocking(move || crate::flatten::flatten_to_jpeg(&data))
            .await
            .map_err(|e| IngestError::Transform(format!("Image task failed: {}", e)))??;
        let size = jpeg.len();

        self.storage
            .put_object(bucket, &destination, jpeg, JPEG_CONTENT_TYPE)
            .await
            .map_err(|e| {
                IngestError::Transform(format!("Failed to store {}: {}", destination, e))
            })?;

        self.storage
            .delete_object(bucket, key)
            .await
            .map_err(|e| IngestError::Transform(format!("Failed to remove original {}: {}", key, e)))?;

        tracing::info!(
            bucket = %bucket,
            from_key = %key,
            to_key = %destination,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image flattened and relocated"
        );

        Ok(())
    }

    #[cfg(not(feature = "image"))]
    async fn reencode_and_relocate(&self, _bucket: &str, key: &str, _data: Vec<u8>) -> IngestResult<()> {
        Err(IngestError::Transform(format!(
            "Cannot re-encode {}: image feature not enabled",
            key
        )))
    }
}

fn log_failure(record: &UploadRecord, error: &IngestError) {
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            bucket = %record.bucket_name,
            key = %record.object_key,
            error_code = error.error_code(),
            error = %error,
            "Record rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            bucket = %record.bucket_name,
            key = %record.object_key,
            error_code = error.error_code(),
            error = %error,
            "Record failed"
        ),
        LogLevel::Error => tracing::error!(
            bucket = %record.bucket_name,
            key = %record.object_key,
            error_code = error.error_code(),
            error = %error,
            "Record failed"
        ),
    }
}
