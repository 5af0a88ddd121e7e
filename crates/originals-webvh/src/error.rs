//! # Version-Log Errors

use originals_core::{CanonicalizationError, IdentifierError, TimestampError};
use originals_crypto::CryptoError;
use thiserror::Error;

/// Errors from creating, extending, parsing or validating a version log.
#[derive(Error, Debug)]
pub enum WebvhError {
    /// Malformed identifier or unsafe path segment.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Canonicalization of an entry or document failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Key or signature decoding failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Invalid timestamp.
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] TimestampError),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The log has no entries.
    #[error("version log is empty")]
    EmptyLog,

    /// A JSONL line could not be parsed.
    #[error("malformed log line {line}: {reason}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// Parser message.
        reason: String,
    },

    /// `versionId` is not `<seq>-<hash>`.
    #[error("invalid versionId {version_id:?}: {reason}")]
    InvalidVersionId {
        /// The rejected version id.
        version_id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Sequence numbers are not contiguous from 1.
    #[error("sequence mismatch at {version_id}: expected {expected}, got {actual}")]
    SequenceMismatch {
        /// Expected sequence number.
        expected: u64,
        /// Sequence number found.
        actual: u64,
        /// Version id of the offending entry.
        version_id: String,
    },

    /// The recomputed SCID does not match the one the log declares.
    #[error("SCID mismatch: declared {declared}, computed {computed}")]
    ScidMismatch {
        /// SCID from the genesis parameters or the document id.
        declared: String,
        /// SCID recomputed from the genesis entry.
        computed: String,
    },

    /// The recomputed entry hash does not match the `versionId`.
    #[error("entry hash mismatch at {version_id}: computed {computed}")]
    EntryHashMismatch {
        /// Version id of the offending entry.
        version_id: String,
        /// Hash recomputed from the entry and its predecessor.
        computed: String,
    },

    /// Parameters are missing, contradictory, or changed illegally.
    #[error("invalid parameters at {version_id}: {reason}")]
    InvalidParameters {
        /// Version id of the offending entry.
        version_id: String,
        /// What was wrong.
        reason: String,
    },

    /// The document `id` does not belong to this log.
    #[error("document id mismatch at {version_id}: {reason}")]
    DocumentIdMismatch {
        /// Version id of the offending entry.
        version_id: String,
        /// What was wrong.
        reason: String,
    },

    /// An entry carries no proof.
    #[error("missing proof at {version_id}")]
    MissingProof {
        /// Version id of the unsigned entry.
        version_id: String,
    },

    /// No verifier is registered for the proof's cryptosuite.
    #[error("unknown cryptosuite {cryptosuite:?} at {version_id}")]
    UnknownCryptosuite {
        /// Cryptosuite name from the proof.
        cryptosuite: String,
        /// Version id of the entry.
        version_id: String,
    },

    /// A verification method id could not be resolved to a key.
    #[error("unresolved verification method {verification_method:?}")]
    UnresolvedVerificationMethod {
        /// The unresolved id.
        verification_method: String,
    },

    /// The signing key is not among the active update keys.
    #[error("key {key} is not an authorized update key at {version_id}")]
    UnauthorizedKey {
        /// Multikey of the signing key.
        key: String,
        /// Version id of the entry (or the one being appended).
        version_id: String,
    },

    /// A proof failed cryptographic verification.
    #[error("proof verification failed at {version_id}: {reason}")]
    ProofInvalid {
        /// Version id of the entry.
        version_id: String,
        /// Verifier message.
        reason: String,
    },

    /// The log is deactivated and cannot be extended.
    #[error("log {did} is deactivated")]
    Deactivated {
        /// DID of the deactivated log.
        did: String,
    },

    /// `versionTime` went backwards.
    #[error("versionTime at {version_id} ({actual}) precedes previous entry ({previous})")]
    TimeOrder {
        /// Version id of the entry.
        version_id: String,
        /// Its versionTime.
        actual: String,
        /// The predecessor's versionTime.
        previous: String,
    },

    /// The signing collaborator failed.
    #[error("signer failed: {0}")]
    Signer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_errors_are_transparent() {
        let err: WebvhError = IdentifierError::segment("..", "relative path segment").into();
        assert!(err.to_string().starts_with("invalid path segment"));
        let err: WebvhError = IdentifierError::format("did:webvh:x", "too short").into();
        assert!(err.to_string().starts_with("invalid identifier format"));
    }

    #[test]
    fn structured_context_in_messages() {
        let err = WebvhError::SequenceMismatch {
            expected: 2,
            actual: 3,
            version_id: "3-Qmabc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("3-Qmabc"));
        assert!(msg.contains("expected 2"));

        let err = WebvhError::MalformedLine {
            line: 4,
            reason: "EOF".into(),
        };
        assert!(err.to_string().contains("line 4"));
    }
}
