//! Error types for the Bitcoin settlement layer.

use originals_core::{ConfigError, IdentifierError};
use thiserror::Error;

/// Result alias used across this crate.
pub type Result<T> = std::result::Result<T, BitcoinError>;

/// Errors from selection, script building and transaction building.
#[derive(Error, Debug)]
pub enum BitcoinError {
    /// The candidate set was empty.
    #[error("no UTXOs provided")]
    NoUtxos,

    /// Fee rate was zero, negative, NaN or infinite.
    #[error("invalid fee rate: {0} sat/vB")]
    InvalidFeeRate(f64),

    /// No eligible subset covers the outputs plus fee.
    #[error("insufficient funds: need {need} sat, have {have} sat")]
    InsufficientFunds { need: u64, have: u64 },

    /// A mandatory UTXO is locked or not among the candidates.
    #[error("mandatory UTXO {outpoint} unusable: {reason}")]
    MandatoryUtxo { outpoint: String, reason: String },

    /// An output would carry less than the dust floor.
    #[error("output value {value} sat is below the dust floor of {dust_floor} sat")]
    BelowDust { value: u64, dust_floor: u64 },

    /// The supplied commit transaction has no output paying the commit script.
    #[error("commit output not found in transaction {txid}")]
    CommitOutputNotFound { txid: String },

    /// A reported txid differs from the transaction this session built.
    #[error("txid mismatch: built {expected}, reported {actual}")]
    TxidMismatch { expected: String, actual: String },

    /// The session cannot move from its current state to the requested one.
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Envelope construction failed (empty content type, oversized tag).
    #[error("invalid inscription envelope: {0}")]
    InvalidEnvelope(String),

    /// Taproot tree or control block construction failed.
    #[error("taproot error: {0}")]
    Taproot(String),

    /// Sighash computation failed.
    #[error("sighash error: {0}")]
    Sighash(String),

    /// PSBT construction failed.
    #[error("PSBT error: {0}")]
    Psbt(String),

    /// Address parsing or network validation failed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A `did:btco` identifier could not be parsed.
    #[error("invalid did:btco identifier {input:?}: {reason}")]
    InvalidDid { input: String, reason: String },

    /// Consensus encoding or decoding failed.
    #[error("bitcoin encoding error: {0}")]
    Encoding(String),

    /// Chain-data collaborator failure, with the step that needed it.
    #[error("chain data unavailable during {step}: {source}")]
    Chain {
        step: &'static str,
        #[source]
        source: ChainError,
    },

    /// A source identifier failed validation.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<bitcoin::consensus::encode::Error> for BitcoinError {
    fn from(e: bitcoin::consensus::encode::Error) -> Self {
        BitcoinError::Encoding(e.to_string())
    }
}

impl From<bitcoin::address::ParseError> for BitcoinError {
    fn from(e: bitcoin::address::ParseError) -> Self {
        BitcoinError::InvalidAddress(e.to_string())
    }
}

impl From<bitcoin::psbt::Error> for BitcoinError {
    fn from(e: bitcoin::psbt::Error) -> Self {
        BitcoinError::Psbt(e.to_string())
    }
}

/// Errors reported by a [`ChainData`](crate::chain::ChainData) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The backend has no record of the transaction.
    #[error("transaction {txid} not found")]
    TransactionNotFound { txid: String },

    /// The backend failed for any other reason.
    #[error("chain backend error: {0}")]
    Backend(String),
}
