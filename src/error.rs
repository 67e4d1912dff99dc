//! Error type for form generation and validation.

use std::fmt;

use honeyform_crypto::CryptoError;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CaptchaError>;

/// Which side of the validity window a timing failure fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingViolation {
    /// Submitted before `generation_time + min_delay`.
    TooFast,
    /// Submitted after `generation_time + max_age`.
    TooOld,
}

impl fmt::Display for TimingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingViolation::TooFast => write!(f, "form submitted too fast"),
            TimingViolation::TooOld => write!(f, "form token expired"),
        }
    }
}

/// Broad category of a failure, used to pick a log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request was forged, tampered with or malformed.
    Tampering,
    /// The bot-detection checks fired (timing or honeypots). Routine.
    TuringTest,
    /// Misconfiguration or a failure inside the library itself.
    Internal,
}

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("The submitted form input is missing the required meta data")]
    MissingMetadata,

    #[error("Meta data signature is invalid")]
    InvalidSignature,

    #[error("Meta data could not be decrypted")]
    DecryptionFailure,

    #[error("Invalid meta data: {0}")]
    InvalidMetadata(String),

    #[error("Invalid form id: expected {expected:?}, got {got:?}")]
    InvalidFormId { expected: String, got: String },

    #[error("Timing check failed: {0}")]
    Timing(TimingViolation),

    #[error("Required field is missing: {field}")]
    HoneypotMissing { field: String },

    #[error("Honeypot field not empty: {field}")]
    HoneypotFilled { field: String, value: String },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaptchaError {
    /// Category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            CaptchaError::MissingMetadata
            | CaptchaError::InvalidSignature
            | CaptchaError::DecryptionFailure
            | CaptchaError::InvalidMetadata(_)
            | CaptchaError::InvalidFormId { .. } => ErrorClass::Tampering,
            CaptchaError::Timing(_)
            | CaptchaError::HoneypotMissing { .. }
            | CaptchaError::HoneypotFilled { .. } => ErrorClass::TuringTest,
            CaptchaError::InvalidOptions(_) | CaptchaError::Crypto(_) | CaptchaError::Json(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// True for the expected bot-detection signals.
    pub fn is_turing_test_failure(&self) -> bool {
        self.class() == ErrorClass::TuringTest
    }

    /// Stable numeric code for validation failures, 0 for everything else.
    pub fn code(&self) -> u32 {
        match self {
            CaptchaError::MissingMetadata => 1,
            CaptchaError::InvalidSignature => 2,
            CaptchaError::InvalidMetadata(_) => 4,
            CaptchaError::DecryptionFailure => 8,
            CaptchaError::Timing(_) => 16,
            CaptchaError::InvalidFormId { .. } => 32,
            CaptchaError::HoneypotFilled { .. } => 64,
            CaptchaError::HoneypotMissing { .. } => 128,
            CaptchaError::InvalidOptions(_) | CaptchaError::Crypto(_) | CaptchaError::Json(_) => 0,
        }
    }
}
