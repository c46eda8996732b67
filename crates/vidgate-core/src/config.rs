//! Configuration module
//!
//! Configuration is read once at process start from the environment (and an optional
//! `.env` file). Per-class policies start from [`MediaClass::default_config`] and can be
//! overridden with `<CLASS>_MAX_SIZE_MB`, `<CLASS>_MAX_DURATION_SECS` and
//! `<CLASS>_ALLOWED_EXTENSIONS`, where `<CLASS>` is `IMAGE`, `PREVIEW_VIDEO` or `FULL_VIDEO`.

use std::env;

use crate::models::{MediaClass, MediaClassConfig};
use crate::storage_types::StorageBackend;

const MB: u64 = 1024 * 1024;

/// Object store client settings.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
}

impl StorageConfig {
    pub fn region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }
}

/// Application configuration for the ingestion handlers.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub environment: String,
    pub log_format: String,
    pub storage: StorageConfig,
    pub image: MediaClassConfig,
    pub preview_video: MediaClassConfig,
    pub full_video: MediaClassConfig,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            s3_region: var("S3_REGION"),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_region: var("AWS_REGION"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
        };

        let config = IngestConfig {
            environment,
            log_format: var("LOG_FORMAT")
                .unwrap_or_else(|| "text".to_string())
                .to_lowercase(),
            storage,
            image: class_config_from_vars(MediaClass::Image, &var)?,
            preview_video: class_config_from_vars(MediaClass::PreviewVideo, &var)?,
            full_video: class_config_from_vars(MediaClass::FullVideo, &var)?,
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.region().is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "Memory storage backend cannot be used in production"
                    ));
                }
            }
        }

        for class in MediaClass::ALL {
            let policy = self.class_config(class);
            if policy.allowed_extensions.is_empty() {
                return Err(anyhow::anyhow!(
                    "{}_ALLOWED_EXTENSIONS must list at least one extension",
                    class.env_prefix()
                ));
            }
            if policy.max_size_bytes == 0 {
                return Err(anyhow::anyhow!(
                    "{}_MAX_SIZE_MB must be greater than zero",
                    class.env_prefix()
                ));
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }

    pub fn class_config(&self, class: MediaClass) -> &MediaClassConfig {
        match class {
            MediaClass::Image => &self.image,
            MediaClass::PreviewVideo => &self.preview_video,
            MediaClass::FullVideo => &self.full_video,
        }
    }
}

fn class_config_from_vars<F>(class: MediaClass, var: &F) -> Result<MediaClassConfig, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = class.default_config();
    let prefix = class.env_prefix();

    let max_size_bytes = match var(&format!("{}_MAX_SIZE_MB", prefix)) {
        Some(s) => {
            s.trim()
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("{}_MAX_SIZE_MB must be a valid number", prefix))?
                * MB
        }
        None => defaults.max_size_bytes,
    };

    let max_duration_seconds = var(&format!("{}_MAX_DURATION_SECS", prefix))
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(defaults.max_duration_seconds);

    let config = match var(&format!("{}_ALLOWED_EXTENSIONS", prefix)) {
        Some(list) => MediaClassConfig::new(max_size_bytes, max_duration_seconds, list.split(',')),
        None => MediaClassConfig {
            max_size_bytes,
            max_duration_seconds,
            ..defaults
        },
    };

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<IngestConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IngestConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.environment, "development");
        assert_eq!(config.image, MediaClass::Image.default_config());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_class_overrides() {
        let config = config_from(&[
            ("IMAGE_MAX_SIZE_MB", "2"),
            ("PREVIEW_VIDEO_ALLOWED_EXTENSIONS", "mp4, WEBM"),
            ("FULL_VIDEO_MAX_DURATION_SECS", "120"),
        ])
        .unwrap();

        assert_eq!(config.image.max_size_bytes, 2 * MB);
        assert!(config.preview_video.allows_extension("webm"));
        assert!(!config.preview_video.allows_extension("mov"));
        assert_eq!(config.full_video.max_duration_seconds, 120);
    }

    #[test]
    fn test_invalid_size_is_an_error() {
        assert!(config_from(&[("IMAGE_MAX_SIZE_MB", "five")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "nfs")]).is_err());
    }

    #[test]
    fn test_validate_s3_requires_region() {
        let config = config_from(&[]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("AWS_REGION", "eu-west-1")]).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.region(), Some("eu-west-1"));
    }

    #[test]
    fn test_validate_local_requires_path() {
        let config = config_from(&[("STORAGE_BACKEND", "local")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/vidgate"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_backend_rejected_in_production() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("ENVIRONMENT", "production"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_allow_list() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("IMAGE_ALLOWED_EXTENSIONS", " , "),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }
}
