//! # originals-crypto: Signing and Encodings
//!
//! - **Ed25519** ([`ed25519`]): signing and verification over
//!   [`CanonicalBytes`](originals_core::CanonicalBytes).
//! - **Multiformats** ([`multiformat`]): multibase base58btc, Ed25519
//!   multikeys, SHA2-256 multihashes.
//! - **Key providers** ([`key_provider`]): in-memory and environment-backed
//!   signing keys behind a `Send + Sync` trait.
//!
//! ## Crate Policy
//!
//! - Depends only on `originals-core` internally.
//! - Private key material never implements `Serialize` and is zeroized on
//!   drop.

pub mod ed25519;
pub mod error;
pub mod key_provider;
pub mod multiformat;

pub use ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
pub use error::CryptoError;
pub use key_provider::{EnvKeyProvider, KeyProvider, LocalKeyProvider, SIGNING_KEY_ENV};
pub use multiformat::{
    decode_ed25519_multikey, decode_multibase, encode_ed25519_multikey, encode_multibase,
    sha256_multihash, sha256_multihash_b58,
};
