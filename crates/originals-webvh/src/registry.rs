//! # Verification-Method Registry
//!
//! Caller-owned map from verification-method id to public key. Validation
//! consults the registry first and falls back to self-describing
//! `did:key:<multikey>#<multikey>` ids, which need no registration.

use std::collections::HashMap;

use originals_crypto::VerifyingKey;
use serde_json::Value;

use crate::error::WebvhError;

/// Verification-method id to key.
#[derive(Debug, Clone, Default)]
pub struct VerificationMethodRegistry {
    methods: HashMap<String, VerifyingKey>,
}

impl VerificationMethodRegistry {
    /// An empty registry. `did:key` ids still resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verification method.
    pub fn register(&mut self, id: impl Into<String>, key: VerifyingKey) {
        self.methods.insert(id.into(), key);
    }

    /// Register every `Multikey` verification method of a DID document.
    ///
    /// Relative ids (`#key-1`) are resolved against the document `id`.
    /// Returns the number of methods registered.
    pub fn register_document(&mut self, document: &Value) -> Result<usize, WebvhError> {
        let doc_id = document.get("id").and_then(Value::as_str).unwrap_or_default();
        let Some(methods) = document.get("verificationMethod").and_then(Value::as_array) else {
            return Ok(0);
        };
        let mut count = 0;
        for vm in methods {
            let (Some(id), Some(mk)) = (
                vm.get("id").and_then(Value::as_str),
                vm.get("publicKeyMultibase").and_then(Value::as_str),
            ) else {
                continue;
            };
            let id = if id.starts_with('#') {
                format!("{doc_id}{id}")
            } else {
                id.to_string()
            };
            self.register(id, VerifyingKey::from_multikey(mk)?);
            count += 1;
        }
        Ok(count)
    }

    /// Resolve a verification-method id to its key.
    pub fn resolve(&self, id: &str) -> Result<VerifyingKey, WebvhError> {
        if let Some(key) = self.methods.get(id) {
            return Ok(*key);
        }
        resolve_did_key(id).ok_or_else(|| WebvhError::UnresolvedVerificationMethod {
            verification_method: id.to_string(),
        })
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no methods are registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

fn resolve_did_key(id: &str) -> Option<VerifyingKey> {
    let rest = id.strip_prefix("did:key:")?;
    let (mk, fragment) = rest.split_once('#')?;
    if mk != fragment {
        return None;
    }
    VerifyingKey::from_multikey(mk).ok()
}
