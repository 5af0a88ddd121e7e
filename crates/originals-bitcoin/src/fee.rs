//! Fee rates and transaction size estimation.

use bitcoin::{Amount, TxOut};

use crate::error::{BitcoinError, Result};
use crate::utxo::Utxo;

/// Version (4) + locktime (4) + input and output counts (1 + 1) +
/// segwit marker and flag (2 WU), rounded up.
pub const TX_OVERHEAD_VSIZE: usize = 11;

/// A validated fee rate in sat/vB.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FeeRate(f64);

impl FeeRate {
    /// Reject zero, negative, NaN and infinite rates.
    pub fn new(sat_per_vb: f64) -> Result<Self> {
        if !sat_per_vb.is_finite() || sat_per_vb <= 0.0 {
            return Err(BitcoinError::InvalidFeeRate(sat_per_vb));
        }
        Ok(Self(sat_per_vb))
    }

    pub fn sat_per_vb(&self) -> f64 {
        self.0
    }

    /// `ceil(vsize * rate)`.
    pub fn fee_for(&self, vsize: usize) -> Amount {
        Amount::from_sat((vsize as f64 * self.0).ceil() as u64)
    }
}

/// Serialized size of one output: value (8) + script length prefix + script.
pub fn output_vsize(output: &TxOut) -> usize {
    let len = output.script_pubkey.len();
    let prefix = if len < 0xfd { 1 } else { 3 };
    8 + prefix + len
}

/// Estimated vsize of a transaction spending `inputs` into `outputs`.
pub fn estimate_vsize<'a>(
    inputs: impl IntoIterator<Item = &'a Utxo>,
    outputs: impl IntoIterator<Item = &'a TxOut>,
) -> usize {
    let ins: usize = inputs.into_iter().map(|u| u.input_kind().vsize()).sum();
    let outs: usize = outputs.into_iter().map(output_vsize).sum();
    TX_OVERHEAD_VSIZE + ins + outs
}
