//! Spendable outputs as seen by the selector.

use bitcoin::{Amount, OutPoint, Script, ScriptBuf, TxOut, Txid};
use serde::{Deserialize, Serialize};

/// An unspent output offered for funding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,
    pub script_pubkey: ScriptBuf,
    /// Carries an inscription; never spent as plain funding unless whitelisted.
    #[serde(default)]
    pub has_resource: bool,
    /// Reserved by the wallet; never selected.
    #[serde(default)]
    pub locked: bool,
}

impl Utxo {
    pub fn new(txid: Txid, vout: u32, value: Amount, script_pubkey: ScriptBuf) -> Self {
        Self {
            txid,
            vout,
            value,
            script_pubkey,
            has_resource: false,
            locked: false,
        }
    }

    pub fn with_resource(mut self) -> Self {
        self.has_resource = true;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }

    /// The output being spent, as a PSBT `witness_utxo`.
    pub fn to_txout(&self) -> TxOut {
        TxOut {
            value: self.value,
            script_pubkey: self.script_pubkey.clone(),
        }
    }

    pub fn input_kind(&self) -> InputKind {
        InputKind::of(&self.script_pubkey)
    }
}

/// Spend type inferred from a locking script, used for size estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Taproot key-path.
    P2tr,
    P2wpkh,
    /// Assumed to wrap P2WPKH.
    P2shP2wpkh,
    /// Legacy, also the fallback for unrecognized scripts.
    P2pkh,
}

impl InputKind {
    pub fn of(script: &Script) -> Self {
        if script.is_p2tr() {
            Self::P2tr
        } else if script.is_p2wpkh() {
            Self::P2wpkh
        } else if script.is_p2sh() {
            Self::P2shP2wpkh
        } else {
            Self::P2pkh
        }
    }

    /// Estimated virtual size of one input of this kind, rounded up.
    pub fn vsize(&self) -> usize {
        match self {
            // 41 bytes base + (1 + 1 + 64) / 4 witness
            Self::P2tr => 58,
            // 41 bytes base + (1 + 1 + 72 + 1 + 33) / 4 witness
            Self::P2wpkh => 68,
            // 41 + 23 redeem push base + P2WPKH witness
            Self::P2shP2wpkh => 91,
            // 41 + 107 scriptSig, no witness
            Self::P2pkh => 148,
        }
    }
}
