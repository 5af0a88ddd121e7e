//! # originals-webvh: DID Version-Log Manager
//!
//! The web-hosted identifier layer: a hash-chained, signed, append-only log
//! of DID document versions whose first entry derives the identifier's
//! self-certifying component (SCID).
//!
//! - [`manager`]: [`create`], [`update`], [`validate`], [`is_valid`].
//! - [`entry`]: log entries, per-entry parameters and the active-parameter
//!   fold.
//! - [`proof`]: Data Integrity proofs and the [`CryptosuiteRegistry`].
//! - [`registry`]: caller-owned [`VerificationMethodRegistry`].
//! - [`signer`]: the [`Signer`] collaborator and its
//!   [`KeyProviderSigner`] adapter.
//! - [`log`]: [`DidLog`] and the JSONL persisted format.
//! - [`location`]: storage path and resolution URL conventions.
//! - [`pointer`]: [`DocumentPointer`], the inscription payload used when a
//!   document migrates to Bitcoin.
//!
//! Hashing and signing go through `CanonicalBytes` from `originals-core`.

pub mod did;
pub mod entry;
pub mod error;
pub mod location;
pub mod log;
pub mod manager;
pub mod pointer;
pub mod proof;
pub mod registry;
pub mod signer;

pub use did::{WebvhDid, SCID_PLACEHOLDER};
pub use entry::{ActiveParameters, LogEntry, Parameters, VersionId, METHOD_VERSION};
pub use error::WebvhError;
pub use location::{log_path, log_url, LOG_FILE_NAME};
pub use log::DidLog;
pub use manager::{
    create, is_valid, update, validate, CreateOptions, CreatedLog, LogUpdate, ValidatedLog,
};
pub use pointer::DocumentPointer;
pub use proof::{Cryptosuite, CryptosuiteRegistry, DataIntegrityProof, ProofOptions};
pub use registry::VerificationMethodRegistry;
pub use signer::{KeyProviderSigner, Signer};
