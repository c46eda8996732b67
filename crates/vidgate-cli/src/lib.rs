//! Helpers shared by the `vidgate` binary.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use vidgate_core::{
    claimed_extension_of, MediaClass, MediaClassConfig, UploadEvent, ValidationOutcome,
};
use vidgate_processing::{detect_image_type, header_of, PolicyValidator};

/// Read an upload notification from a file, or from stdin when `source` is `None` or `-`.
pub async fn read_event(source: Option<&Path>) -> anyhow::Result<UploadEvent> {
    let raw = match source {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event file {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read event from stdin")?;
            buf
        }
    };

    UploadEvent::from_json(&raw).context("Invalid upload notification")
}

/// Result of checking a local file against a class policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub file: String,
    pub class: MediaClass,
    pub extension: String,
    pub size_bytes: u64,
    /// Image format recognized from the leading bytes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_image_type: Option<&'static str>,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Run the policy and signature checks on a local file without touching storage.
pub async fn check_file(
    path: &Path,
    class: MediaClass,
    config: MediaClassConfig,
) -> anyhow::Result<CheckReport> {
    let size_bytes = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();

    let mut header = Vec::new();
    tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?
        .take(vidgate_processing::HEADER_LEN as u64)
        .read_to_end(&mut header)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let file = path.to_string_lossy().to_string();
    let extension = claimed_extension_of(&file);
    let outcome = PolicyValidator::new(class, config).validate(
        size_bytes,
        &extension,
        header_of(&header),
    );

    let reason = match outcome {
        ValidationOutcome::Accepted => None,
        ValidationOutcome::Rejected(reason) => Some(format!("{} {}", class.label(), reason)),
    };

    Ok(CheckReport {
        file,
        class,
        extension,
        size_bytes,
        detected_image_type: detect_image_type(&header),
        accepted: outcome.is_accepted(),
        reason,
    })
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}
