//! Media classes and their upload policies.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const MB: u64 = 1024 * 1024;

/// The kind of media an ingestion handler is responsible for.
///
/// Each class has its own size/type policy, signature table and post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaClass {
    Image,
    PreviewVideo,
    FullVideo,
}

impl MediaClass {
    pub const ALL: [MediaClass; 3] = [
        MediaClass::Image,
        MediaClass::PreviewVideo,
        MediaClass::FullVideo,
    ];

    /// Human label used as the prefix of failure messages.
    pub fn label(&self) -> &'static str {
        match self {
            MediaClass::Image => "Image",
            MediaClass::PreviewVideo => "Preview video",
            MediaClass::FullVideo => "Full video",
        }
    }

    /// Message returned when a whole batch validates.
    pub fn success_message(&self) -> &'static str {
        match self {
            MediaClass::Image => "Images validated successfully",
            MediaClass::PreviewVideo => "Preview videos validated successfully",
            MediaClass::FullVideo => "Full videos validated successfully",
        }
    }

    /// Prefix for the class-specific environment variables, e.g. `IMAGE_MAX_SIZE_MB`.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            MediaClass::Image => "IMAGE",
            MediaClass::PreviewVideo => "PREVIEW_VIDEO",
            MediaClass::FullVideo => "FULL_VIDEO",
        }
    }

    pub fn is_video(&self) -> bool {
        !matches!(self, MediaClass::Image)
    }

    pub fn default_config(&self) -> MediaClassConfig {
        match self {
            MediaClass::Image => MediaClassConfig::new(
                5 * MB,
                0,
                ["jpg", "jpeg", "png", "gif", "webp"],
            ),
            MediaClass::PreviewVideo => {
                MediaClassConfig::new(100 * MB, 60, ["mp4", "mov", "webm"])
            }
            MediaClass::FullVideo => MediaClassConfig::new(
                10 * 1024 * MB,
                4 * 60 * 60,
                ["mp4", "mov", "m4v", "webm", "mpeg", "mpg"],
            ),
        }
    }
}

impl FromStr for MediaClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "image" => Ok(MediaClass::Image),
            "preview-video" => Ok(MediaClass::PreviewVideo),
            "full-video" => Ok(MediaClass::FullVideo),
            _ => Err(anyhow::anyhow!("Invalid media class: {}", s)),
        }
    }
}

impl Display for MediaClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaClass::Image => write!(f, "image"),
            MediaClass::PreviewVideo => write!(f, "preview-video"),
            MediaClass::FullVideo => write!(f, "full-video"),
        }
    }
}

/// Upload policy for one media class.
///
/// `max_duration_seconds` is advisory: nothing probes media duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaClassConfig {
    pub max_size_bytes: u64,
    pub max_duration_seconds: u64,
    pub allowed_extensions: BTreeSet<String>,
}

impl MediaClassConfig {
    pub fn new<I, S>(max_size_bytes: u64, max_duration_seconds: u64, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            max_size_bytes,
            max_duration_seconds,
            allowed_extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(&extension.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_class() {
        assert_eq!("image".parse::<MediaClass>().unwrap(), MediaClass::Image);
        assert_eq!(
            "preview_video".parse::<MediaClass>().unwrap(),
            MediaClass::PreviewVideo
        );
        assert_eq!(
            "Full-Video".parse::<MediaClass>().unwrap(),
            MediaClass::FullVideo
        );
        assert!("audio".parse::<MediaClass>().is_err());
    }

    #[test]
    fn test_image_defaults() {
        let config = MediaClass::Image.default_config();
        assert_eq!(config.max_size_bytes, 5 * 1024 * 1024);
        assert!(config.allows_extension("JPG"));
        assert!(!config.allows_extension("mp4"));
    }

    #[test]
    fn test_extensions_are_normalized() {
        let config = MediaClassConfig::new(10, 0, [" MP4", "Mov", ""]);
        assert_eq!(config.allowed_extensions.len(), 2);
        assert!(config.allows_extension("mp4"));
        assert!(config.allows_extension("mov"));
    }

    #[test]
    fn test_success_messages() {
        assert_eq!(
            MediaClass::FullVideo.success_message(),
            "Full videos validated successfully"
        );
        assert_eq!(MediaClass::PreviewVideo.label(), "Preview video");
    }
}
