//! # originals-bitcoin: Bitcoin Settlement Layer
//!
//! Moves an asset onto Bitcoin by inscribing a payload (normally a
//! `DocumentPointer` to its current `did:webvh` document) with a Taproot
//! commit/reveal pair.
//!
//! - [`selector`] chooses funding inputs and computes fees. Pure.
//! - [`inscription`] builds the envelope script and its Taproot commitment.
//! - [`builder`] is the commit/reveal state machine producing PSBTs.
//! - [`chain`] is the capability trait for node/indexer access; nothing in
//!   this crate talks to the network.
//! - [`migration`] holds `did:btco` identifiers and the provenance record
//!   emitted once a reveal is final.

pub mod builder;
pub mod chain;
pub mod config;
pub mod error;
pub mod fee;
pub mod inscription;
pub mod migration;
pub mod selector;
pub mod utxo;

pub use builder::{
    CommitOptions, CommitTransaction, InscriptionSession, RevealTransaction, SessionState,
    TransitionRecord, COMMIT_VOUT,
};
pub use chain::{ChainData, ConfirmationStatus, InMemoryChainData};
pub use config::{BitcoinConfig, Network};
pub use error::{BitcoinError, ChainError, Result};
pub use fee::{estimate_vsize, FeeRate};
pub use inscription::{verify_commitment, InscriptionCommitment, InscriptionEnvelope, MAX_PUSH_SIZE};
pub use migration::{BtcoDid, MigrationRecord};
pub use selector::{select_utxos, Selection, SelectionRequest};
pub use utxo::{InputKind, Utxo};

pub use bitcoin;
