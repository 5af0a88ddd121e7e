//! # Key Provider Abstraction
//!
//! Ed25519 key storage and signing behind a trait:
//!
//! - [`LocalKeyProvider`]: in-memory key for development and tests.
//! - [`EnvKeyProvider`]: hex-encoded 32-byte seed read from an environment
//!   variable (by default `ORIGINALS_SIGNING_KEY`).
//!
//! Log-entry signers and the CLI hold a `Box<dyn KeyProvider>` so the
//! backend is chosen at startup.

use originals_core::CanonicalBytes;

use crate::ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
use crate::error::CryptoError;

/// Environment variable read by [`EnvKeyProvider::from_default_env`].
pub const SIGNING_KEY_ENV: &str = "ORIGINALS_SIGNING_KEY";

/// Ed25519 key storage and signing backend.
pub trait KeyProvider: Send + Sync {
    /// Sign canonicalized data with the managed key.
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError>;

    /// The managed public key.
    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError>;

    /// Name used in logs.
    fn provider_name(&self) -> &str;
}

// ─── LocalKeyProvider ────────────────────────────────────────────────────

/// In-memory key provider.
pub struct LocalKeyProvider {
    key: SigningKey,
}

impl LocalKeyProvider {
    /// Wrap an existing signing key.
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self::new(SigningKey::generate())
    }

    /// Create from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(SigningKey::from_seed(seed))
    }

    /// The wrapped key, for exporting after `keygen`.
    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }
}

impl KeyProvider for LocalKeyProvider {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.key.sign(data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        Ok(self.key.verifying_key())
    }

    fn provider_name(&self) -> &str {
        "LocalKeyProvider"
    }
}

impl std::fmt::Debug for LocalKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyProvider")
            .field("verifying_key", &self.key.verifying_key())
            .finish()
    }
}

// ─── EnvKeyProvider ──────────────────────────────────────────────────────

/// Loads a signing key from an environment variable holding a 64-char hex
/// seed. The key is read once at construction.
pub struct EnvKeyProvider {
    key: SigningKey,
    var_name: String,
}

impl EnvKeyProvider {
    /// Load from the named variable.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let hex_seed = zeroize::Zeroizing::new(std::env::var(var_name).map_err(|_| {
            CryptoError::KeyUnavailable(format!("environment variable {var_name} not set"))
        })?);
        let key = SigningKey::from_hex(&hex_seed).map_err(|e| match e {
            CryptoError::InvalidSigningKey(msg) => {
                CryptoError::InvalidSigningKey(format!("{var_name}: {msg}"))
            }
            other => other,
        })?;
        Ok(Self {
            key,
            var_name: var_name.to_string(),
        })
    }

    /// Load from [`SIGNING_KEY_ENV`].
    pub fn from_default_env() -> Result<Self, CryptoError> {
        Self::from_env(SIGNING_KEY_ENV)
    }

    /// The variable this provider was loaded from.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl std::fmt::Debug for EnvKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvKeyProvider")
            .field("var_name", &self.var_name)
            .field("verifying_key", &self.key.verifying_key())
            .finish()
    }
}

impl KeyProvider for EnvKeyProvider {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.key.sign(data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        Ok(self.key.verifying_key())
    }

    fn provider_name(&self) -> &str {
        "EnvKeyProvider"
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────
