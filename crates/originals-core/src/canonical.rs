//! # Canonical Serialization: JCS Byte Production
//!
//! `CanonicalBytes` is the only type accepted by digest computation and
//! signing anywhere in the workspace. Version-log entry hashes, SCIDs,
//! proof signing inputs, cache content hashes and inscription pointer
//! payloads are all computed over `CanonicalBytes`.
//!
//! ## Security Invariant
//!
//! The inner buffer is private. The only constructors run the value
//! through float rejection and RFC 8785 (JSON Canonicalization Scheme)
//! serialization, so two parties that hash "the same" DID document always
//! hash the same bytes.
//!
//! Floats are rejected because JCS number formatting is the one place
//! where independent implementations historically disagree. Log entries,
//! DID documents and pointers only ever carry integers and strings.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - Object keys are sorted, separators are compact (RFC 8785).
/// - No float values appear anywhere in the tree.
/// - The inner `Vec<u8>` is valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `FloatRejected` if the value tree contains a non-integer number,
    /// `SerializationFailed` if the value cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Canonicalize an already-built JSON value.
    ///
    /// Used by callers that edit the value tree before hashing (stripping
    /// `proof`, substituting the SCID placeholder).
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume and return the canonical bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
    }
}
