//! # Fee & UTXO Selector
//!
//! Picks a deterministic funding subset for a set of outputs and computes
//! the fee of the transaction built from exactly that subset.
//!
//! ## Rules
//!
//! 1. Mandatory outpoints go in first, resource flag notwithstanding. A
//!    locked or unknown mandatory outpoint is an error.
//! 2. Locked UTXOs never enter the pool. Resource-carrying UTXOs enter it
//!    only when whitelisted.
//! 3. The pool is ordered by value descending, then txid ascending, then
//!    vout ascending, and consumed until the selection covers outputs + fee.
//! 4. Change is added when what remains after the with-change fee is at
//!    least the dust floor; otherwise the remainder goes to the fee.
//!
//! Amount arithmetic is checked. A target or fee beyond `u64` satoshis is
//! reported as insufficient funds.

use bitcoin::{Amount, OutPoint, ScriptBuf, TxOut};
use tracing::debug;

use crate::error::{BitcoinError, Result};
use crate::fee::{estimate_vsize, FeeRate};
use crate::utxo::Utxo;

/// What the transaction must pay for.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    /// Non-change outputs, in order.
    pub outputs: Vec<TxOut>,
    /// Fee rate in sat/vB; validated by [`select_utxos`].
    pub fee_rate: f64,
    /// Locking script for change.
    pub change_script: ScriptBuf,
    pub dust_floor: Amount,
    /// Outpoints that must be spent.
    pub mandatory: Vec<OutPoint>,
    /// Resource-carrying outpoints allowed as plain funding.
    pub resource_whitelist: Vec<OutPoint>,
}

impl SelectionRequest {
    pub fn new(outputs: Vec<TxOut>, fee_rate: f64, change_script: ScriptBuf) -> Self {
        Self {
            outputs,
            fee_rate,
            change_script,
            dust_floor: Amount::from_sat(crate::config::DEFAULT_DUST_FLOOR),
            mandatory: Vec::new(),
            resource_whitelist: Vec::new(),
        }
    }

    pub fn with_dust_floor(mut self, dust_floor: Amount) -> Self {
        self.dust_floor = dust_floor;
        self
    }

    pub fn with_mandatory(mut self, outpoint: OutPoint) -> Self {
        self.mandatory.push(outpoint);
        self
    }

    pub fn allow_resource(mut self, outpoint: OutPoint) -> Self {
        self.resource_whitelist.push(outpoint);
        self
    }

    /// Sum of the non-change outputs, `None` on overflow.
    pub fn target(&self) -> Option<Amount> {
        checked_sum(self.outputs.iter().map(|o| o.value))
    }
}

fn checked_sum(values: impl IntoIterator<Item = Amount>) -> Option<Amount> {
    values.into_iter().try_fold(Amount::ZERO, Amount::checked_add)
}

pub(crate) fn saturating_total(utxos: &[Utxo]) -> u64 {
    utxos
        .iter()
        .fold(0u64, |acc, u| acc.saturating_add(u.value.to_sat()))
}

/// A funding decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Selected inputs in spend order: mandatory first, then pool order.
    pub selected: Vec<Utxo>,
    pub total_in: Amount,
    /// Fee actually paid, including any remainder folded in for lack of change.
    pub fee: Amount,
    /// Change output, placed after the requested outputs.
    pub change: Option<TxOut>,
    /// Estimated vsize the fee was computed for.
    pub vsize: usize,
}

impl Selection {
    pub fn change_value(&self) -> Amount {
        self.change.as_ref().map(|c| c.value).unwrap_or(Amount::ZERO)
    }
}

/// Select funding for `request` from `candidates`.
pub fn select_utxos(candidates: &[Utxo], request: &SelectionRequest) -> Result<Selection> {
    if candidates.is_empty() {
        return Err(BitcoinError::NoUtxos);
    }
    let rate = FeeRate::new(request.fee_rate)?;
    let target = request.target().ok_or_else(|| BitcoinError::InsufficientFunds {
        need: u64::MAX,
        have: saturating_total(candidates),
    })?;

    let mut selected = Vec::new();
    for outpoint in &request.mandatory {
        let utxo = candidates
            .iter()
            .find(|u| u.outpoint() == *outpoint)
            .ok_or_else(|| BitcoinError::MandatoryUtxo {
                outpoint: outpoint.to_string(),
                reason: "not among the candidates".into(),
            })?;
        if utxo.locked {
            return Err(BitcoinError::MandatoryUtxo {
                outpoint: outpoint.to_string(),
                reason: "locked".into(),
            });
        }
        if !selected.iter().any(|s: &Utxo| s.outpoint() == *outpoint) {
            selected.push(utxo.clone());
        }
    }

    let mut pool: Vec<&Utxo> = candidates
        .iter()
        .filter(|u| !u.locked)
        .filter(|u| !u.has_resource || request.resource_whitelist.contains(&u.outpoint()))
        .filter(|u| !selected.iter().any(|s| s.outpoint() == u.outpoint()))
        .collect();
    pool.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.txid.cmp(&b.txid))
            .then_with(|| a.vout.cmp(&b.vout))
    });
    let mut pool = pool.into_iter();

    loop {
        if let Some(selection) = try_fund(&selected, request, target, rate) {
            debug!(
                inputs = selection.selected.len(),
                total_in = selection.total_in.to_sat(),
                fee = selection.fee.to_sat(),
                change = selection.change_value().to_sat(),
                "UTXO selection complete"
            );
            return Ok(selection);
        }
        match pool.next() {
            Some(utxo) => selected.push(utxo.clone()),
            None => {
                let vsize = estimate_vsize(&selected, &request.outputs);
                let need = target
                    .checked_add(rate.fee_for(vsize))
                    .map_or(u64::MAX, |n| n.to_sat());
                return Err(BitcoinError::InsufficientFunds {
                    need,
                    have: saturating_total(&selected),
                });
            }
        }
    }
}

/// The selection for exactly `selected`, if it covers outputs and fee.
fn try_fund(
    selected: &[Utxo],
    request: &SelectionRequest,
    target: Amount,
    rate: FeeRate,
) -> Option<Selection> {
    if selected.is_empty() {
        return None;
    }
    let total_in = checked_sum(selected.iter().map(|u| u.value))?;

    let bare_vsize = estimate_vsize(selected, &request.outputs);
    let bare_fee = rate.fee_for(bare_vsize);
    let remainder = total_in.checked_sub(target)?.checked_sub(bare_fee)?;

    let change_template = TxOut {
        value: Amount::ZERO,
        script_pubkey: request.change_script.clone(),
    };
    let change_vsize =
        estimate_vsize(selected, request.outputs.iter().chain(std::iter::once(&change_template)));
    let change_fee = rate.fee_for(change_vsize);
    let change_value = total_in
        .checked_sub(target)
        .and_then(|r| r.checked_sub(change_fee))
        .filter(|v| *v >= request.dust_floor);

    Some(match change_value {
        Some(value) => Selection {
            selected: selected.to_vec(),
            total_in,
            fee: change_fee,
            change: Some(TxOut {
                value,
                script_pubkey: request.change_script.clone(),
            }),
            vsize: change_vsize,
        },
        None => Selection {
            selected: selected.to_vec(),
            total_in,
            fee: bare_fee + remainder,
            change: None,
            vsize: bare_vsize,
        },
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::Txid;
    use proptest::prelude::*;

    fn p2tr() -> ScriptBuf {
        ScriptBuf::from_bytes([&[0x51, 0x20][..], &[3u8; 32]].concat())
    }

    fn candidates(values: &[u64]) -> Vec<Utxo> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Utxo::new(
                    Txid::from_byte_array([i as u8; 32]),
                    i as u32,
                    Amount::from_sat(*v),
                    p2tr(),
                )
            })
            .collect()
    }

    proptest! {
        #[test]
        fn selection_covers_target_and_is_minimal(
            values in proptest::collection::vec(600u64..200_000, 1..12),
            amount in 546u64..300_000,
            rate in 1u32..50,
        ) {
            let utxos = candidates(&values);
            let req = SelectionRequest::new(
                vec![TxOut { value: Amount::from_sat(amount), script_pubkey: p2tr() }],
                rate as f64,
                p2tr(),
            );
            if let Ok(sel) = select_utxos(&utxos, &req) {
                let target = Amount::from_sat(amount);
                prop_assert!(sel.total_in >= target + sel.fee);
                prop_assert_eq!(sel.total_in, target + sel.fee + sel.change_value());
                prop_assert!(sel.fee >= FeeRate::new(rate as f64).unwrap().fee_for(sel.vsize));

                // Dropping any selected input leaves the rest underfunded.
                for skip in 0..sel.selected.len() {
                    let rest: Vec<Utxo> = sel
                        .selected
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != skip)
                        .map(|(_, u)| u.clone())
                        .collect();
                    let rest_total: Amount = rest.iter().map(|u| u.value).sum();
                    let rest_fee = FeeRate::new(rate as f64)
                        .unwrap()
                        .fee_for(estimate_vsize(&rest, &req.outputs));
                    prop_assert!(rest.is_empty() || rest_total < target + rest_fee);
                }
            }
        }

        #[test]
        fn selection_is_order_independent(
            values in proptest::collection::vec(600u64..100_000, 1..10),
            amount in 546u64..100_000,
        ) {
            let utxos = candidates(&values);
            let mut reversed = utxos.clone();
            reversed.reverse();
            let req = SelectionRequest::new(
                vec![TxOut { value: Amount::from_sat(amount), script_pubkey: p2tr() }],
                3.0,
                p2tr(),
            );
            let a = select_utxos(&utxos, &req).ok();
            let b = select_utxos(&reversed, &req).ok();
            prop_assert_eq!(a, b);
        }
    }
}
