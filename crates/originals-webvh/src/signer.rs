//! # Signing Collaborator
//!
//! The log manager never touches private keys. It asks a [`Signer`] for
//! its update key and verification method, builds the proof options,
//! canonicalizes the signing input and hands both to
//! [`Signer::sign`], which returns the complete proof.

use originals_core::CanonicalBytes;
use originals_crypto::KeyProvider;

use crate::error::WebvhError;
use crate::proof::{DataIntegrityProof, ProofOptions};

/// Key-management collaborator for log entries.
pub trait Signer: Send + Sync {
    /// Multikey of the signing key, as listed in `updateKeys`.
    fn update_key(&self) -> Result<String, WebvhError>;

    /// Verification-method id placed in the proof.
    fn verification_method(&self) -> Result<String, WebvhError>;

    /// Sign `data` (the canonical signing input for `options`).
    fn sign(
        &self,
        options: ProofOptions,
        data: &CanonicalBytes,
    ) -> Result<DataIntegrityProof, WebvhError>;
}

/// [`Signer`] backed by any [`KeyProvider`], using `did:key` verification
/// method ids.
pub struct KeyProviderSigner {
    provider: Box<dyn KeyProvider>,
}

impl KeyProviderSigner {
    /// Wrap a key provider.
    pub fn new(provider: impl KeyProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
        }
    }

    /// Wrap an already boxed provider.
    pub fn from_boxed(provider: Box<dyn KeyProvider>) -> Self {
        Self { provider }
    }
}

impl Signer for KeyProviderSigner {
    fn update_key(&self) -> Result<String, WebvhError> {
        Ok(self.provider.verifying_key()?.to_multikey())
    }

    fn verification_method(&self) -> Result<String, WebvhError> {
        Ok(self.provider.verifying_key()?.to_did_key_vm())
    }

    fn sign(
        &self,
        options: ProofOptions,
        data: &CanonicalBytes,
    ) -> Result<DataIntegrityProof, WebvhError> {
        let signature = self.provider.sign(data).map_err(|e| {
            WebvhError::Signer(format!("{}: {e}", self.provider.provider_name()))
        })?;
        Ok(options.into_proof(signature.to_multibase()))
    }
}

impl std::fmt::Debug for KeyProviderSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyProviderSigner")
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}
