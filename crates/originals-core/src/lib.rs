//! # originals-core: Foundational Types
//!
//! The leaf of the workspace dependency graph. Defines the primitives every
//! other crate builds on:
//!
//! 1. **`CanonicalBytes`.** All hashing and signing flows through JCS
//!    canonicalization. There is no path from raw `serde_json::to_vec()`
//!    output to a digest or signature.
//!
//! 2. **`ContentDigest`.** Tagged SHA-256 digests computed only from
//!    `CanonicalBytes`.
//!
//! 3. **`Did` and the path-segment grammar.** Identifiers are validated at
//!    construction; unsafe path segments are rejected before any log
//!    material is produced.
//!
//! 4. **UTC-only `Timestamp`.** `Z` suffix, seconds precision, strict on
//!    both serialization and deserialization.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `originals-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod config;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use config::{env_bool, env_parse, ConfigError};
pub use digest::{digest_value, sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, IdentifierError, TimestampError};
pub use identity::{
    sanitize_domain, validate_domain, validate_path_segment, validate_path_segments, Did,
    DidMethod, SessionId,
};
pub use temporal::Timestamp;
