//! # Data Integrity Proofs
//!
//! Every log entry carries one or more [`DataIntegrityProof`]s. The signing
//! input is the JCS form of the entry with its `proof` member replaced by
//! the proof options (the proof minus `proofValue`), so the proof's
//! verification method, purpose and creation time are covered by the
//! signature.
//!
//! Verification is dispatched through a [`CryptosuiteRegistry`] keyed by
//! cryptosuite name. `eddsa-jcs-2022` is registered by default; callers may
//! register additional suites.

use std::collections::HashMap;

use originals_core::{CanonicalBytes, Timestamp};
use originals_crypto::{CryptoError, Ed25519Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WebvhError;

/// The proof `type` this implementation produces.
pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";

/// Proof purpose used for log entries.
pub const ASSERTION_METHOD: &str = "assertionMethod";

/// Cryptosuite tag on a proof.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Cryptosuite {
    /// Ed25519 over JCS canonical bytes.
    EddsaJcs2022,
    /// Any other suite, verified only if registered.
    Other(String),
}

impl Cryptosuite {
    /// Suite name as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::EddsaJcs2022 => "eddsa-jcs-2022",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Cryptosuite {
    fn from(s: String) -> Self {
        match s.as_str() {
            "eddsa-jcs-2022" => Self::EddsaJcs2022,
            _ => Self::Other(s),
        }
    }
}

impl From<Cryptosuite> for String {
    fn from(c: Cryptosuite) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for Cryptosuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof configuration: everything in a proof except its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOptions {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub cryptosuite: Cryptosuite,
    pub verification_method: String,
    pub created: Timestamp,
    pub proof_purpose: String,
}

impl ProofOptions {
    /// Default `eddsa-jcs-2022` assertion options for `verification_method`.
    pub fn new(verification_method: impl Into<String>, created: Timestamp) -> Self {
        Self {
            proof_type: DATA_INTEGRITY_PROOF.to_string(),
            cryptosuite: Cryptosuite::EddsaJcs2022,
            verification_method: verification_method.into(),
            created,
            proof_purpose: ASSERTION_METHOD.to_string(),
        }
    }

    /// Attach a proof value.
    pub fn into_proof(self, proof_value: String) -> DataIntegrityProof {
        DataIntegrityProof {
            proof_type: self.proof_type,
            cryptosuite: self.cryptosuite,
            verification_method: self.verification_method,
            created: self.created,
            proof_purpose: self.proof_purpose,
            proof_value,
        }
    }

    /// Canonical signing input for `unsigned_entry` under these options.
    ///
    /// `unsigned_entry` must be the entry object without `proof`.
    pub fn signing_input(&self, unsigned_entry: &Value) -> Result<CanonicalBytes, WebvhError> {
        let mut value = unsigned_entry.clone();
        match &mut value {
            Value::Object(map) => {
                map.insert("proof".to_string(), serde_json::to_value(self)?);
            }
            _ => {
                return Err(WebvhError::ProofInvalid {
                    version_id: String::new(),
                    reason: "entry is not a JSON object".to_string(),
                })
            }
        }
        Ok(CanonicalBytes::from_value(value)?)
    }
}

/// A W3C Data Integrity proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DataIntegrityProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub cryptosuite: Cryptosuite,
    pub verification_method: String,
    pub created: Timestamp,
    pub proof_purpose: String,
    pub proof_value: String,
}

impl DataIntegrityProof {
    /// The options this proof was created under.
    pub fn options(&self) -> ProofOptions {
        ProofOptions {
            proof_type: self.proof_type.clone(),
            cryptosuite: self.cryptosuite.clone(),
            verification_method: self.verification_method.clone(),
            created: self.created,
            proof_purpose: self.proof_purpose.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cryptosuite registry
// ---------------------------------------------------------------------------

/// Verifies `proof` over `data` against `key`.
pub type VerifyFn =
    fn(proof: &DataIntegrityProof, data: &CanonicalBytes, key: &VerifyingKey) -> Result<(), CryptoError>;

/// Cryptosuite name to verifier.
#[derive(Clone)]
pub struct CryptosuiteRegistry {
    suites: HashMap<String, VerifyFn>,
}

impl CryptosuiteRegistry {
    /// A registry with no suites.
    pub fn empty() -> Self {
        Self {
            suites: HashMap::new(),
        }
    }

    /// Register (or replace) the verifier for `name`.
    pub fn register(&mut self, name: impl Into<String>, verify: VerifyFn) {
        self.suites.insert(name.into(), verify);
    }

    /// Whether a verifier exists for `suite`.
    pub fn supports(&self, suite: &Cryptosuite) -> bool {
        self.suites.contains_key(suite.as_str())
    }

    /// Verify a proof for the entry at `version_id`.
    pub fn verify(
        &self,
        proof: &DataIntegrityProof,
        data: &CanonicalBytes,
        key: &VerifyingKey,
        version_id: &str,
    ) -> Result<(), WebvhError> {
        let verify = self.suites.get(proof.cryptosuite.as_str()).ok_or_else(|| {
            WebvhError::UnknownCryptosuite {
                cryptosuite: proof.cryptosuite.to_string(),
                version_id: version_id.to_string(),
            }
        })?;
        verify(proof, data, key).map_err(|e| WebvhError::ProofInvalid {
            version_id: version_id.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for CryptosuiteRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Cryptosuite::EddsaJcs2022.as_str(), verify_eddsa_jcs_2022);
        registry
    }
}

impl std::fmt::Debug for CryptosuiteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.suites.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CryptosuiteRegistry").field("suites", &names).finish()
    }
}

/// `eddsa-jcs-2022`: multibase Ed25519 signature over the signing input.
pub fn verify_eddsa_jcs_2022(
    proof: &DataIntegrityProof,
    data: &CanonicalBytes,
    key: &VerifyingKey,
) -> Result<(), CryptoError> {
    if proof.proof_type != DATA_INTEGRITY_PROOF {
        return Err(CryptoError::VerificationFailed(format!(
            "unexpected proof type {:?}",
            proof.proof_type
        )));
    }
    let signature = Ed25519Signature::from_multibase(&proof.proof_value)?;
    key.verify(data, &signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use originals_crypto::SigningKey;

    fn created() -> Timestamp {
        Timestamp::parse("2026-02-01T10:00:00Z").unwrap()
    }

    fn signed(sk: &SigningKey, entry: &Value) -> DataIntegrityProof {
        let vk = sk.verifying_key();
        let options = ProofOptions::new(vk.to_did_key_vm(), created());
        let data = options.signing_input(entry).unwrap();
        let sig = sk.sign(&data);
        options.into_proof(sig.to_multibase())
    }

    #[test]
    fn cryptosuite_serde() {
        let json = serde_json::to_string(&Cryptosuite::EddsaJcs2022).unwrap();
        assert_eq!(json, r#""eddsa-jcs-2022""#);
        let other: Cryptosuite = serde_json::from_str(r#""bbs-2023""#).unwrap();
        assert_eq!(other, Cryptosuite::Other("bbs-2023".into()));
    }

    #[test]
    fn proof_wire_shape() {
        let sk = SigningKey::from_seed(&[3; 32]);
        let proof = signed(&sk, &serde_json::json!({"state": {}}));
        let v = serde_json::to_value(&proof).unwrap();
        assert_eq!(v["type"], "DataIntegrityProof");
        assert_eq!(v["cryptosuite"], "eddsa-jcs-2022");
        assert_eq!(v["proofPurpose"], "assertionMethod");
        assert_eq!(v["created"], "2026-02-01T10:00:00Z");
        assert!(v["proofValue"].as_str().unwrap().starts_with('z'));
        assert_eq!(proof.options().verification_method, sk.verifying_key().to_did_key_vm());
    }

    #[test]
    fn default_registry_verifies_eddsa() {
        let sk = SigningKey::generate();
        let entry = serde_json::json!({"versionId": "1-Qm", "state": {"id": "x"}});
        let proof = signed(&sk, &entry);
        let data = proof.options().signing_input(&entry).unwrap();
        let registry = CryptosuiteRegistry::default();
        registry.verify(&proof, &data, &sk.verifying_key(), "1-Qm").unwrap();

        let tampered = serde_json::json!({"versionId": "1-Qm", "state": {"id": "y"}});
        let data = proof.options().signing_input(&tampered).unwrap();
        assert!(matches!(
            registry.verify(&proof, &data, &sk.verifying_key(), "1-Qm"),
            Err(WebvhError::ProofInvalid { .. })
        ));
    }

    #[test]
    fn options_are_covered_by_signature() {
        let sk = SigningKey::generate();
        let entry = serde_json::json!({"state": {}});
        let mut proof = signed(&sk, &entry);
        proof.created = Timestamp::parse("2030-01-01T00:00:00Z").unwrap();
        let data = proof.options().signing_input(&entry).unwrap();
        assert!(CryptosuiteRegistry::default()
            .verify(&proof, &data, &sk.verifying_key(), "1-Qm")
            .is_err());
    }

    #[test]
    fn unknown_suite_rejected_until_registered() {
        let sk = SigningKey::generate();
        let entry = serde_json::json!({});
        let mut proof = signed(&sk, &entry);
        proof.cryptosuite = Cryptosuite::Other("test-suite".into());
        let data = proof.options().signing_input(&entry).unwrap();

        let mut registry = CryptosuiteRegistry::default();
        assert!(matches!(
            registry.verify(&proof, &data, &sk.verifying_key(), "1-Qm"),
            Err(WebvhError::UnknownCryptosuite { .. })
        ));
        fn accept_all(
            _: &DataIntegrityProof,
            _: &CanonicalBytes,
            _: &VerifyingKey,
        ) -> Result<(), CryptoError> {
            Ok(())
        }
        registry.register("test-suite", accept_all);
        assert!(registry.supports(&proof.cryptosuite));
        registry.verify(&proof, &data, &sk.verifying_key(), "1-Qm").unwrap();
    }
}
