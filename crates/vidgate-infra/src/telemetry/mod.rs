//! Telemetry initialization
//!
//! Installs the global tracing subscriber. Filtering follows `RUST_LOG` when set and
//! falls back to [`DEFAULT_FILTER`].

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, DEFAULT_FILTER};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON lines, anything else the human format.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_setting() {
        assert_eq!(LogFormat::from_setting(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::from_setting(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::from_setting(Some("text")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_setting(None), LogFormat::Pretty);
    }
}
