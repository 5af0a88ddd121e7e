//! # Log Entries and Parameters
//!
//! One line of the version log. Entries carry only the parameters that
//! changed; [`ActiveParameters`] is the left fold over the chain.
//!
//! ## Hash Input
//!
//! The entry hash covers the entry *without* `proof`, with `versionId`
//! replaced by the predecessor's version id (the SCID for entry 1). Typed
//! (de)serialization denies unknown fields so the bytes hashed on
//! validation are exactly the bytes the author hashed.

use originals_core::{CanonicalBytes, Timestamp};
use originals_crypto::sha256_multihash_b58;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WebvhError;
use crate::proof::DataIntegrityProof;

/// The only method version this implementation writes and accepts.
pub const METHOD_VERSION: &str = "did:webvh:1.0";

// ---------------------------------------------------------------------------
// VersionId
// ---------------------------------------------------------------------------

/// Parsed `<seq>-<entryHash>` version id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionId {
    /// 1-based position in the log.
    pub seq: u64,
    /// base58btc multihash of the entry.
    pub hash: String,
}

impl VersionId {
    /// Parse a version id string.
    pub fn parse(s: &str) -> Result<Self, WebvhError> {
        let invalid = |reason: &str| WebvhError::InvalidVersionId {
            version_id: s.to_string(),
            reason: reason.to_string(),
        };
        let (seq, hash) = s.split_once('-').ok_or_else(|| invalid("expected <seq>-<hash>"))?;
        let seq: u64 = seq.parse().map_err(|_| invalid("sequence is not a number"))?;
        if seq == 0 {
            return Err(invalid("sequence starts at 1"));
        }
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("entry hash is not base58"));
        }
        Ok(Self {
            seq,
            hash: hash.to_string(),
        })
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.seq, self.hash)
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameters carried by a single entry. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Parameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

/// Parameters in force after some entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveParameters {
    pub method: String,
    pub scid: String,
    pub update_keys: Vec<String>,
    pub portable: bool,
    pub deactivated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl ActiveParameters {
    /// Establish parameters from the genesis entry.
    pub fn genesis(params: &Parameters, version_id: &str) -> Result<Self, WebvhError> {
        let invalid = |reason: &str| WebvhError::InvalidParameters {
            version_id: version_id.to_string(),
            reason: reason.to_string(),
        };
        let method = params.method.clone().ok_or_else(|| invalid("genesis must set method"))?;
        if method != METHOD_VERSION {
            return Err(invalid("unsupported method version"));
        }
        let scid = params.scid.clone().ok_or_else(|| invalid("genesis must set scid"))?;
        let update_keys = params
            .update_keys
            .clone()
            .ok_or_else(|| invalid("genesis must set updateKeys"))?;
        if update_keys.is_empty() {
            return Err(invalid("genesis updateKeys is empty"));
        }
        Ok(Self {
            method,
            scid,
            update_keys,
            portable: params.portable.unwrap_or(false),
            deactivated: params.deactivated.unwrap_or(false),
            ttl: params.ttl,
        })
    }

    /// Fold a later entry's parameters into the active set.
    pub fn apply(&self, params: &Parameters, version_id: &str) -> Result<Self, WebvhError> {
        let invalid = |reason: &str| WebvhError::InvalidParameters {
            version_id: version_id.to_string(),
            reason: reason.to_string(),
        };
        if params.scid.as_ref().is_some_and(|s| s != &self.scid) {
            return Err(invalid("scid cannot change"));
        }
        if params.method.as_deref().is_some_and(|m| m != METHOD_VERSION) {
            return Err(invalid("unsupported method version"));
        }
        if params.portable == Some(true) && !self.portable {
            return Err(invalid("portable can only be enabled at genesis"));
        }
        if self.deactivated && params.deactivated == Some(false) {
            return Err(invalid("deactivation is permanent"));
        }
        let mut next = self.clone();
        if let Some(keys) = &params.update_keys {
            next.update_keys = keys.clone();
        }
        if let Some(portable) = params.portable {
            next.portable = portable;
        }
        if let Some(deactivated) = params.deactivated {
            next.deactivated = deactivated;
        }
        if params.ttl.is_some() {
            next.ttl = params.ttl;
        }
        if !next.deactivated && next.update_keys.is_empty() {
            return Err(invalid("updateKeys may only be emptied on deactivation"));
        }
        Ok(next)
    }

    /// Whether `multikey` may sign the next entry.
    pub fn authorizes(&self, multikey: &str) -> bool {
        self.update_keys.iter().any(|k| k == multikey)
    }
}

// ---------------------------------------------------------------------------
// LogEntry
// ---------------------------------------------------------------------------

/// One entry of a `did:webvh` version log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LogEntry {
    pub version_id: String,
    pub version_time: Timestamp,
    pub parameters: Parameters,
    pub state: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proof: Vec<DataIntegrityProof>,
}

impl LogEntry {
    /// The entry as JSON with `proof` removed.
    pub fn unsigned_value(&self) -> Result<Value, WebvhError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("proof");
        }
        Ok(value)
    }

    /// Entry hash chained to `predecessor` (previous versionId, or the SCID
    /// for the first entry).
    pub fn entry_hash(&self, predecessor: &str) -> Result<String, WebvhError> {
        let mut value = self.unsigned_value()?;
        value["versionId"] = Value::String(predecessor.to_string());
        let canonical = CanonicalBytes::from_value(value)?;
        Ok(sha256_multihash_b58(&canonical))
    }

    /// Parsed `versionId`.
    pub fn parsed_version_id(&self) -> Result<VersionId, WebvhError> {
        VersionId::parse(&self.version_id)
    }

    /// The `id` of the document in `state`, if any.
    pub fn document_id(&self) -> Option<&str> {
        self.state.get("id").and_then(Value::as_str)
    }
}
