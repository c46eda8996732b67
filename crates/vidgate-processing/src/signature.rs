//! Magic-byte signature matching.
//!
//! The first [`HEADER_LEN`](crate::collector::HEADER_LEN) bytes of an upload are hex
//! encoded and compared with the hex encoding of every pattern registered for the claimed
//! extension. Images must match at offset zero; video containers may carry the pattern
//! anywhere in the header because box sizes vary.

use vidgate_core::MediaClass;

use crate::collector::HEADER_LEN;

/// Fewest header bytes that can identify any supported format.
pub const MIN_HEADER_LEN: usize = 4;

type Entries = &'static [(&'static str, &'static [&'static [u8]])];

/// Extension → bytes that must also sit at a fixed offset.
type Markers = &'static [(&'static str, usize, &'static [u8])];

/// How a pattern must occur in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Header starts with the pattern.
    Prefix,
    /// Pattern occurs anywhere in the header.
    Contains,
}

impl MatchRule {
    pub fn for_class(class: MediaClass) -> Self {
        if class.is_video() {
            MatchRule::Contains
        } else {
            MatchRule::Prefix
        }
    }
}

/// Extension → byte patterns for one family of media classes.
#[derive(Debug)]
pub struct SignatureTable {
    rule: MatchRule,
    entries: Entries,
    markers: Markers,
}

const JPEG_PATTERNS: &[&[u8]] = &[
    &[0xFF, 0xD8, 0xFF, 0xE0],
    &[0xFF, 0xD8, 0xFF, 0xE1],
    &[0xFF, 0xD8, 0xFF, 0xE2],
    &[0xFF, 0xD8, 0xFF, 0xE3],
    &[0xFF, 0xD8, 0xFF, 0xE8],
    &[0xFF, 0xD8, 0xFF, 0xDB],
    &[0xFF, 0xD8, 0xFF, 0xEE],
];

const PNG_PATTERNS: &[&[u8]] = &[&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]];

const GIF_PATTERNS: &[&[u8]] = &[b"GIF87a", b"GIF89a"];

// RIFF container; the WEBP fourcc at offset 8 is checked as a marker.
const WEBP_PATTERNS: &[&[u8]] = &[b"RIFF"];

const WEBP_FOURCC_OFFSET: usize = 8;
const WEBP_FOURCC: &[u8] = b"WEBP";

const MP4_PATTERNS: &[&[u8]] = &[
    b"ftypisom",
    b"ftypiso2",
    b"ftypmp41",
    b"ftypmp42",
    b"ftypavc1",
    b"ftypMSNV",
    b"ftypdash",
];

const MOV_PATTERNS: &[&[u8]] = &[b"ftypqt  ", b"moov", b"mdat", b"wide", b"free"];

const M4V_PATTERNS: &[&[u8]] = &[b"ftypM4V ", b"ftypM4VH", b"ftypM4VP", b"ftypmp42"];

const WEBM_PATTERNS: &[&[u8]] = &[&[0x1A, 0x45, 0xDF, 0xA3]];

const MPEG_PATTERNS: &[&[u8]] = &[&[0x00, 0x00, 0x01, 0xBA], &[0x00, 0x00, 0x01, 0xB3]];

pub static IMAGE_SIGNATURES: SignatureTable = SignatureTable {
    rule: MatchRule::Prefix,
    entries: &[
        ("jpg", JPEG_PATTERNS),
        ("jpeg", JPEG_PATTERNS),
        ("png", PNG_PATTERNS),
        ("gif", GIF_PATTERNS),
        ("webp", WEBP_PATTERNS),
    ],
    markers: &[("webp", WEBP_FOURCC_OFFSET, WEBP_FOURCC)],
};

pub static VIDEO_SIGNATURES: SignatureTable = SignatureTable {
    rule: MatchRule::Contains,
    entries: &[
        ("mp4", MP4_PATTERNS),
        ("mov", MOV_PATTERNS),
        ("m4v", M4V_PATTERNS),
        ("webm", WEBM_PATTERNS),
        ("mpeg", MPEG_PATTERNS),
        ("mpg", MPEG_PATTERNS),
    ],
    markers: &[],
};

impl SignatureTable {
    pub fn for_class(class: MediaClass) -> &'static SignatureTable {
        match MatchRule::for_class(class) {
            MatchRule::Prefix => &IMAGE_SIGNATURES,
            MatchRule::Contains => &VIDEO_SIGNATURES,
        }
    }

    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    /// Patterns registered for an extension (case-insensitive).
    pub fn patterns(&self, extension: &str) -> Option<&'static [&'static [u8]]> {
        let extension = extension.to_lowercase();
        self.entries
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, patterns)| *patterns)
    }

    /// Whether the header carries a signature registered for the claimed extension.
    ///
    /// `jpg` and `jpeg` share one pattern set, so JPEG content passes under either
    /// name. Unknown extensions and headers shorter than [`MIN_HEADER_LEN`] never match.
    pub fn matches(&self, header: &[u8], claimed_extension: &str) -> bool {
        let extension = claimed_extension.to_lowercase();
        let Some(patterns) = self.patterns(&extension) else {
            return false;
        };

        if header.len() < MIN_HEADER_LEN {
            return false;
        }

        let header = &header[..header.len().min(HEADER_LEN)];
        let header_hex = hex::encode(header);

        let pattern_found = patterns.iter().any(|pattern| {
            let pattern_hex = hex::encode(pattern);
            match self.rule {
                MatchRule::Prefix => header_hex.starts_with(&pattern_hex),
                MatchRule::Contains => header_hex.contains(&pattern_hex),
            }
        });

        pattern_found && self.markers_present(header, &extension)
    }

    fn markers_present(&self, header: &[u8], extension: &str) -> bool {
        self.markers
            .iter()
            .filter(|(ext, _, _)| *ext == extension)
            .all(|(_, offset, marker)| {
                header.get(*offset..*offset + marker.len()) == Some(*marker)
            })
    }
}

/// Detect the image format of content from its leading bytes.
pub fn detect_image_type(header: &[u8]) -> Option<&'static str> {
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if header.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("png")
    } else if header.starts_with(b"GIF8") {
        Some("gif")
    } else if header.starts_with(b"RIFF")
        && header.get(WEBP_FOURCC_OFFSET..WEBP_FOURCC_OFFSET + WEBP_FOURCC.len())
            == Some(WEBP_FOURCC)
    {
        Some("webp")
    } else {
        None
    }
}
