//! # Document Pointer
//!
//! The canonical inscription payload for migrating a `did:webvh` asset to
//! Bitcoin: which identifier, at which version, with which document digest.

use originals_core::{digest_value, CanonicalBytes};
use serde::{Deserialize, Serialize};

use crate::error::WebvhError;
use crate::manager::ValidatedLog;

/// Pointer to one version of a web-hosted identifier document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPointer {
    pub did: String,
    pub version_id: String,
    /// `sha256:<hex>` of the JCS document.
    pub document_digest: String,
}

impl DocumentPointer {
    /// Pointer to the latest version of a validated log.
    pub fn from_validated(log: &ValidatedLog) -> Result<Self, WebvhError> {
        Ok(Self {
            did: log.did.to_string(),
            version_id: log.version_id.clone(),
            document_digest: digest_value(&log.document)?.to_string(),
        })
    }

    /// Canonical bytes, used verbatim as the inscription body.
    pub fn to_canonical_bytes(&self) -> Result<CanonicalBytes, WebvhError> {
        Ok(CanonicalBytes::new(self)?)
    }

    /// Content type for the inscription envelope.
    pub const CONTENT_TYPE: &'static str = "application/json";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_payload_is_sorted_json() {
        let pointer = DocumentPointer {
            did: "did:webvh:QmX:example.com".into(),
            version_id: "2-QmY".into(),
            document_digest: "sha256:00".into(),
        };
        let bytes = pointer.to_canonical_bytes().unwrap();
        assert_eq!(
            std::str::from_utf8(bytes.as_bytes()).unwrap(),
            r#"{"did":"did:webvh:QmX:example.com","documentDigest":"sha256:00","versionId":"2-QmY"}"#
        );
    }
}
