//! Chain-data capability.
//!
//! Node and indexer communication stays outside this crate. A backend
//! implements [`ChainData`] and is handed to the transaction builder at the
//! point it needs chain state; [`InMemoryChainData`] serves tests and
//! offline use.

use std::collections::HashMap;
use std::sync::Arc;

use bitcoin::{consensus, Address, Transaction, Txid};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::utxo::Utxo;

/// Confirmation depth of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfirmationStatus {
    pub confirmations: u32,
    pub block_height: Option<u32>,
}

impl ConfirmationStatus {
    pub fn unconfirmed() -> Self {
        Self::default()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmations > 0
    }
}

/// Read access to chain state, one implementation per backend.
pub trait ChainData: Send + Sync {
    /// Unspent outputs paying `address`.
    fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>, ChainError>;

    /// Consensus-serialized transaction bytes.
    fn get_raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, ChainError>;

    fn get_confirmation_status(&self, txid: &Txid) -> Result<ConfirmationStatus, ChainError>;
}

/// In-memory backend. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChainData {
    utxos: Arc<RwLock<HashMap<String, Vec<Utxo>>>>,
    transactions: Arc<RwLock<HashMap<Txid, Vec<u8>>>>,
    confirmations: Arc<RwLock<HashMap<Txid, ConfirmationStatus>>>,
}

impl InMemoryChainData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_utxo(&self, address: &Address, utxo: Utxo) {
        self.utxos
            .write()
            .entry(address.to_string())
            .or_default()
            .push(utxo);
    }

    /// Record a broadcast transaction as unconfirmed.
    pub fn insert_transaction(&self, tx: &Transaction) -> Txid {
        let txid = tx.compute_txid();
        self.transactions.write().insert(txid, consensus::serialize(tx));
        self.confirmations
            .write()
            .entry(txid)
            .or_insert_with(ConfirmationStatus::unconfirmed);
        txid
    }

    /// Mine a known transaction to the given depth.
    pub fn confirm(&self, txid: Txid, confirmations: u32, block_height: u32) {
        self.confirmations.write().insert(
            txid,
            ConfirmationStatus {
                confirmations,
                block_height: Some(block_height),
            },
        );
    }
}

impl ChainData for InMemoryChainData {
    fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>, ChainError> {
        Ok(self
            .utxos
            .read()
            .get(&address.to_string())
            .cloned()
            .unwrap_or_default())
    }

    fn get_raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, ChainError> {
        self.transactions
            .read()
            .get(txid)
            .cloned()
            .ok_or_else(|| ChainError::TransactionNotFound {
                txid: txid.to_string(),
            })
    }

    fn get_confirmation_status(&self, txid: &Txid) -> Result<ConfirmationStatus, ChainError> {
        self.confirmations
            .read()
            .get(txid)
            .copied()
            .ok_or_else(|| ChainError::TransactionNotFound {
                txid: txid.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::{absolute, transaction, Amount, ScriptBuf, TxIn, TxOut};

    fn tx(value: u64) -> Transaction {
        Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![TxIn::default()],
            output: vec![TxOut {
                value: Amount::from_sat(value),
                script_pubkey: ScriptBuf::new(),
            }],
        }
    }

    #[test]
    fn transactions_and_confirmations() {
        let chain = InMemoryChainData::new();
        let txid = chain.insert_transaction(&tx(1_000));
        assert!(!chain.get_confirmation_status(&txid).unwrap().is_confirmed());

        let raw = chain.get_raw_transaction(&txid).unwrap();
        let decoded: Transaction = consensus::deserialize(&raw).unwrap();
        assert_eq!(decoded.compute_txid(), txid);

        let shared = chain.clone();
        shared.confirm(txid, 2, 800_000);
        let status = chain.get_confirmation_status(&txid).unwrap();
        assert_eq!(status.confirmations, 2);
        assert_eq!(status.block_height, Some(800_000));
    }

    #[test]
    fn unknown_txid_is_not_found() {
        let chain = InMemoryChainData::new();
        let txid = Txid::from_byte_array([1; 32]);
        assert!(matches!(
            chain.get_raw_transaction(&txid),
            Err(ChainError::TransactionNotFound { .. })
        ));
        assert!(chain.get_confirmation_status(&txid).is_err());
    }
}
