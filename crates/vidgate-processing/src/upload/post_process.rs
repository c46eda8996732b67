//! Class-specific handling of accepted uploads.

use vidgate_core::MediaClass;

/// Source prefix → processed prefix for flattened images.
pub const PROCESSED_PREFIXES: &[(&str, &str)] = &[
    ("landscape-images/", "flattened-landscape-images/"),
    ("portrait-images/", "flattened-portrait-images/"),
];

/// What happens to an upload once it validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Leave the object in place (videos wait for the external transcoder).
    Identity,
    /// Re-encode to a flattened JPEG under the processed prefix and remove the original.
    ReencodeAndRelocate,
}

impl PostProcess {
    pub fn for_class(class: MediaClass) -> Self {
        match class {
            MediaClass::Image => PostProcess::ReencodeAndRelocate,
            MediaClass::PreviewVideo | MediaClass::FullVideo => PostProcess::Identity,
        }
    }
}

/// Destination key for a flattened image, or `None` when the key is outside every
/// known source prefix.
pub fn relocated_key(key: &str) -> Option<String> {
    PROCESSED_PREFIXES.iter().find_map(|(source, processed)| {
        key.strip_prefix(source)
            .map(|rest| format!("{}{}", processed, rest))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocated_key() {
        assert_eq!(
            relocated_key("landscape-images/user-1/beach.png").as_deref(),
            Some("flattened-landscape-images/user-1/beach.png")
        );
        assert_eq!(
            relocated_key("portrait-images/me.jpg").as_deref(),
            Some("flattened-portrait-images/me.jpg")
        );
    }

    #[test]
    fn test_relocated_key_requires_leading_prefix() {
        assert_eq!(relocated_key("flattened-portrait-images/me.jpg"), None);
        assert_eq!(relocated_key("avatars/me.jpg"), None);
        assert_eq!(relocated_key("nested/landscape-images/me.jpg"), None);
    }

    #[test]
    fn test_post_process_per_class() {
        assert_eq!(
            PostProcess::for_class(MediaClass::Image),
            PostProcess::ReencodeAndRelocate
        );
        assert_eq!(
            PostProcess::for_class(MediaClass::FullVideo),
            PostProcess::Identity
        );
    }
}
