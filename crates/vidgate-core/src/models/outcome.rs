//! Validation outcomes and the handler response contract.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

/// Why an upload was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidFileType,
    ExceedsSizeLimit,
    InvalidFileSignature,
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RejectReason::InvalidFileType => write!(f, "invalid file type"),
            RejectReason::ExceedsSizeLimit => write!(f, "exceeds size limit"),
            RejectReason::InvalidFileSignature => write!(f, "invalid file signature"),
        }
    }
}

/// Result of validating one upload record. Drives the accept/delete decision only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(RejectReason),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }
}

/// Response returned to the trigger when every record in a batch succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub message: String,
    pub processed: usize,
}

impl HandlerResponse {
    pub fn ok(message: impl Into<String>, processed: usize) -> Self {
        Self {
            status_code: 200,
            message: message.into(),
            processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serializes_camel_case() {
        let response = HandlerResponse::ok("Full videos validated successfully", 1);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["message"], "Full videos validated successfully");
        assert_eq!(json["processed"], 1);
    }

    #[test]
    fn test_reject_reason_messages() {
        assert_eq!(RejectReason::InvalidFileType.to_string(), "invalid file type");
        assert_eq!(
            RejectReason::ExceedsSizeLimit.to_string(),
            "exceeds size limit"
        );
        assert!(!ValidationOutcome::Rejected(RejectReason::InvalidFileSignature).is_accepted());
    }
}
