use vidgate_core::{MediaClass, MediaClassConfig, RejectReason, ValidationOutcome};

use crate::signature::SignatureTable;

/// Size/type/signature policy for one media class
///
/// Provides the validation logic shared by every ingestion handler without coupling
/// to storage. Duration limits in the config are advisory and not checked.
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    class: MediaClass,
    config: MediaClassConfig,
    signatures: &'static SignatureTable,
}

impl PolicyValidator {
    pub fn new(class: MediaClass, config: MediaClassConfig) -> Self {
        Self {
            class,
            config,
            signatures: SignatureTable::for_class(class),
        }
    }

    pub fn class(&self) -> MediaClass {
        self.class
    }

    pub fn config(&self) -> &MediaClassConfig {
        &self.config
    }

    /// Type and size checks only.
    ///
    /// A size equal to `max_size_bytes` is allowed.
    pub fn check_policy(&self, size_bytes: u64, claimed_extension: &str) -> ValidationOutcome {
        if !self.config.allows_extension(claimed_extension) {
            return ValidationOutcome::Rejected(RejectReason::InvalidFileType);
        }

        if size_bytes > self.config.max_size_bytes {
            return ValidationOutcome::Rejected(RejectReason::ExceedsSizeLimit);
        }

        ValidationOutcome::Accepted
    }

    /// Full validation: policy, then the signature check on the header.
    pub fn validate(
        &self,
        size_bytes: u64,
        claimed_extension: &str,
        header: &[u8],
    ) -> ValidationOutcome {
        let outcome = self.check_policy(size_bytes, claimed_extension);
        if !outcome.is_accepted() {
            return outcome;
        }

        if !self.signatures.matches(header, claimed_extension) {
            return ValidationOutcome::Rejected(RejectReason::InvalidFileSignature);
        }

        ValidationOutcome::Accepted
    }
}
