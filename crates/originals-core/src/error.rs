//! # Error Types
//!
//! Leaf error types shared by every crate in the workspace. All use
//! `thiserror`. Input-validation errors carry the offending input so a
//! caller can report it without re-deriving anything.

use thiserror::Error;

/// Error during canonical serialization or digest parsing.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// A hex digest string could not be parsed.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

/// Identifier validation failure.
///
/// Raised before any log material or cryptographic work is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier is malformed or missing required components.
    #[error("invalid identifier format: {input:?} ({reason})")]
    InvalidFormat {
        /// The rejected input.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A path segment violates the safe-segment grammar.
    #[error("invalid path segment: {segment:?} ({reason})")]
    InvalidPathSegment {
        /// The rejected segment.
        segment: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The DID method is not one this core understands.
    #[error("unsupported DID method: {0:?}")]
    UnsupportedMethod(String),
}

impl IdentifierError {
    /// Shorthand for [`IdentifierError::InvalidFormat`].
    pub fn format(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`IdentifierError::InvalidPathSegment`].
    pub fn segment(segment: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPathSegment {
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }
}

/// Timestamp parsing failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Only `Z`-suffixed UTC timestamps are accepted.
    #[error("timestamp must use Z suffix (UTC only), got {0:?}")]
    NotUtc(String),

    /// The string is not RFC 3339.
    #[error("invalid RFC 3339 timestamp {input:?}: {reason}")]
    Invalid {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// Epoch seconds out of chrono's representable range.
    #[error("invalid unix timestamp: {0}")]
    OutOfRange(i64),
}
