//! # Multiformat Encodings
//!
//! The self-describing encodings used on the wire by the version log:
//!
//! - **multibase base58btc**: `z` followed by base58 (Bitcoin alphabet).
//!   Used for `publicKeyMultibase`, `updateKeys` and `proofValue`.
//! - **multikey**: multibase of `0xed 0x01 || ed25519-public-key`.
//! - **multihash sha2-256**: `0x12 0x20 || sha256(data)`, rendered as bare
//!   base58btc (no multibase prefix) for SCIDs and entry hashes.

use originals_core::CanonicalBytes;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Multicodec prefix for an Ed25519 public key.
pub const ED25519_PUB_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Multihash prefix for a 32-byte SHA2-256 digest.
pub const SHA2_256_MULTIHASH: [u8; 2] = [0x12, 0x20];

/// Multibase prefix character for base58btc.
pub const BASE58BTC_PREFIX: char = 'z';

/// Encode bytes as multibase base58btc (`z...`).
pub fn encode_multibase(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    out.push(BASE58BTC_PREFIX);
    out.push_str(&bs58::encode(bytes).into_string());
    out
}

/// Decode a multibase base58btc string.
pub fn decode_multibase(s: &str) -> Result<Vec<u8>, CryptoError> {
    let body = s
        .strip_prefix(BASE58BTC_PREFIX)
        .ok_or_else(|| CryptoError::Multibase(format!("expected base58btc 'z' prefix: {s:?}")))?;
    bs58::decode(body)
        .into_vec()
        .map_err(|e| CryptoError::Multibase(format!("{s:?}: {e}")))
}

/// Encode an Ed25519 public key as a multikey string (`z6Mk...`).
pub fn encode_ed25519_multikey(public_key: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(34);
    raw.extend_from_slice(&ED25519_PUB_MULTICODEC);
    raw.extend_from_slice(public_key);
    encode_multibase(&raw)
}

/// Decode a multikey string into raw Ed25519 public key bytes.
pub fn decode_ed25519_multikey(s: &str) -> Result<[u8; 32], CryptoError> {
    let raw = decode_multibase(s)?;
    let key = raw
        .strip_prefix(&ED25519_PUB_MULTICODEC[..])
        .ok_or_else(|| CryptoError::Multibase(format!("not an ed25519-pub multikey: {s:?}")))?;
    key.try_into().map_err(|_| {
        CryptoError::InvalidPublicKey(format!("expected 32 key bytes, got {}", key.len()))
    })
}

/// SHA2-256 multihash of canonical bytes.
pub fn sha256_multihash(data: &CanonicalBytes) -> Vec<u8> {
    let digest = Sha256::digest(data.as_bytes());
    let mut out = Vec::with_capacity(34);
    out.extend_from_slice(&SHA2_256_MULTIHASH);
    out.extend_from_slice(&digest);
    out
}

/// Bare base58btc rendering of the SHA2-256 multihash.
pub fn sha256_multihash_b58(data: &CanonicalBytes) -> String {
    bs58::encode(sha256_multihash(data)).into_string()
}
