//! Upload events delivered by the object-store trigger.
//!
//! The trigger delivers the standard notification shape:
//! `{"Records": [{"s3": {"bucket": {"name": ..}, "object": {"key": ..}}}]}`.
//! Object keys are URL-encoded in notifications and are decoded here, so the rest
//! of the pipeline only ever sees real keys.

use serde::{Deserialize, Serialize};

/// One uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRecord {
    pub bucket_name: String,
    pub object_key: String,
}

impl UploadRecord {
    pub fn new(bucket_name: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_key: object_key.into(),
        }
    }

    /// Extension claimed by the key; see [`claimed_extension_of`].
    pub fn claimed_extension(&self) -> String {
        claimed_extension_of(&self.object_key)
    }
}

/// Extension claimed by an object key or file name: the lowercased suffix after the
/// last `.` of the final path segment, or an empty string when there is none.
pub fn claimed_extension_of(key: &str) -> String {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// A batch of upload records for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Notification")]
pub struct UploadEvent {
    pub records: Vec<UploadRecord>,
}

impl UploadEvent {
    pub fn new(records: Vec<UploadRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    s3: NotificationEntity,
}

#[derive(Debug, Deserialize)]
struct NotificationEntity {
    bucket: NotificationBucket,
    object: NotificationObject,
}

#[derive(Debug, Deserialize)]
struct NotificationBucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NotificationObject {
    key: String,
}

impl TryFrom<Notification> for UploadEvent {
    type Error = String;

    fn try_from(notification: Notification) -> Result<Self, Self::Error> {
        let records = notification
            .records
            .into_iter()
            .map(|r| {
                let key = decode_object_key(&r.s3.object.key)?;
                Ok(UploadRecord::new(r.s3.bucket.name, key))
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(UploadEvent { records })
    }
}

/// Decode a notification object key (`+` is a space, `%XX` escapes).
pub fn decode_object_key(raw: &str) -> Result<String, String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|k| k.into_owned())
        .map_err(|e| format!("Invalid object key encoding '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notification() {
        let json = r#"{
            "Records": [
                {
                    "eventName": "ObjectCreated:Put",
                    "s3": {
                        "bucket": {"name": "media-uploads"},
                        "object": {"key": "landscape-images/My+Photo%281%29.JPG", "size": 1024}
                    }
                },
                {
                    "s3": {
                        "bucket": {"name": "media-uploads"},
                        "object": {"key": "full-videos/movie.mp4"}
                    }
                }
            ]
        }"#;

        let event = UploadEvent::from_json(json).unwrap();
        assert_eq!(event.len(), 2);
        assert_eq!(event.records[0].bucket_name, "media-uploads");
        assert_eq!(
            event.records[0].object_key,
            "landscape-images/My Photo(1).JPG"
        );
        assert_eq!(event.records[0].claimed_extension(), "jpg");
        assert_eq!(event.records[1].claimed_extension(), "mp4");
    }

    #[test]
    fn test_parse_empty_notification() {
        let event = UploadEvent::from_json("{}").unwrap();
        assert!(event.is_empty());
    }

    #[test]
    fn test_invalid_key_encoding_is_rejected() {
        let json = r#"{"Records":[{"s3":{"bucket":{"name":"b"},"object":{"key":"bad%FFkey.mp4"}}}]}"#;
        assert!(UploadEvent::from_json(json).is_err());
    }

    #[test]
    fn test_claimed_extension_edge_cases() {
        assert_eq!(UploadRecord::new("b", "noext").claimed_extension(), "");
        assert_eq!(
            UploadRecord::new("b", "dir.with.dots/noext").claimed_extension(),
            ""
        );
        assert_eq!(
            UploadRecord::new("b", "a/archive.tar.GZ").claimed_extension(),
            "gz"
        );
    }
}
