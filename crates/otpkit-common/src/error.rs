//! Error types for otpkit components.
//!
//! Fatal errors are raised through [`OtpError`]; routine challenge outcomes
//! (wrong guess, expiry, exhaustion) are never errors and live in
//! [`crate::SolveError`] instead.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cause attached to a `BAD_REQUEST` error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadRequestCause {
    /// Malformed, tampered, or store-unmatched token
    BadToken,
    /// Resend requested before the resend window opened
    TooEarlyToResend,
}

impl BadRequestCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadToken => "BAD_TOKEN",
            Self::TooEarlyToResend => "TOO_EARLY_TO_RESEND",
        }
    }
}

impl fmt::Display for BadRequestCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cause attached to an `INTERNAL_ERROR` error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternalErrorCause {
    /// The solution store or the delivery callback failed
    StorageFailure,
    /// A token could not be produced from a record
    EncodingFailure,
}

impl InternalErrorCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::EncodingFailure => "ENCODING_FAILURE",
        }
    }
}

impl fmt::Display for InternalErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors raised by OTP operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    /// Caller misuse: bad token or premature resend
    #[error("BAD_REQUEST: {0}")]
    BadRequest(BadRequestCause),

    /// Infrastructure failure
    #[error("INTERNAL_ERROR: {0}")]
    Internal(InternalErrorCause),
}

impl OtpError {
    pub fn bad_token() -> Self {
        Self::BadRequest(BadRequestCause::BadToken)
    }

    pub fn too_early_to_resend() -> Self {
        Self::BadRequest(BadRequestCause::TooEarlyToResend)
    }

    pub fn storage_failure() -> Self {
        Self::Internal(InternalErrorCause::StorageFailure)
    }

    pub fn encoding_failure() -> Self {
        Self::Internal(InternalErrorCause::EncodingFailure)
    }

    /// Wire name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Wire name of the cause
    pub fn cause(&self) -> &'static str {
        match self {
            Self::BadRequest(cause) => cause.as_str(),
            Self::Internal(cause) => cause.as_str(),
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Returns true if the caller may retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal(InternalErrorCause::StorageFailure))
    }
}

/// Errors detected while validating configuration, before any request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ttl factor cannot be less than 1 (got {0})")]
    InvalidTtlFactor(f64),

    #[error("max attempts must be at least 1")]
    ZeroAttempts,

    #[error("id entropy must be at least 1 byte")]
    ZeroIdEntropy,

    #[error("hashing algorithm '{name}' is not supported. Supported: {supported}")]
    UnsupportedHashingAlgorithm { name: String, supported: String },

    #[error("unsupported encryption scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid secret length. Must be {expected} but {actual} was provided")]
    InvalidSecretLength { expected: usize, actual: usize },

    #[error("codec '{0}' requires a secret")]
    MissingSecret(String),

    #[error("number of digits must be between 4 and 18 (got {0})")]
    InvalidSolutionDigits(u32),

    #[error("{field} of {value} ms is out of range")]
    DurationOutOfRange { field: &'static str, value: u64 },
}
