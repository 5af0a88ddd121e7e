//! # Bitcoin Transaction Builder
//!
//! Drives one inscription through commit and reveal.
//!
//! ```text
//! UNFUNDED → COMMIT_BUILT → COMMIT_BROADCAST → COMMIT_CONFIRMED
//!          → REVEAL_BUILT → REVEAL_BROADCAST → FINALIZED
//! ```
//!
//! The `*_BUILT` states are entered by this builder. Broadcast and
//! confirmation happen elsewhere and are reported back through the `mark_*`
//! methods or picked up by [`InscriptionSession::refresh`]. Every
//! transition is checked against the sequence above; anything else is an
//! [`BitcoinError::InvalidTransition`].
//!
//! The commit transaction is returned unsigned as a base64 PSBT with
//! `witness_utxo` populated. The reveal is signed here with the one-time key
//! (BIP-341 script-path, `SIGHASH_DEFAULT`) and returned both as a complete
//! transaction and as a PSBT carrying the final witness.

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{Prevouts, SighashCache};
use bitcoin::{
    absolute, consensus, transaction, Address, Amount, OutPoint, Psbt, Script, ScriptBuf,
    Sequence, TapSighashType, Transaction, TxIn, TxOut, Txid, Witness,
};
use originals_core::{Did, SessionId, Timestamp};
use serde::Serialize;
use tracing::{debug, info};

use crate::chain::ChainData;
use crate::config::BitcoinConfig;
use crate::error::{BitcoinError, Result};
use crate::fee::FeeRate;
use crate::inscription::{verify_commitment, InscriptionCommitment, InscriptionEnvelope};
use crate::migration::{inscription_id, payload_digest, BtcoDid, MigrationRecord};
use crate::selector::{saturating_total, select_utxos, Selection, SelectionRequest};
use crate::utxo::Utxo;

/// Output index of the inscription output in the commit transaction.
pub const COMMIT_VOUT: u32 = 0;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of an inscription session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Unfunded,
    CommitBuilt,
    /// Reported by the caller.
    CommitBroadcast,
    /// Reported by the caller or observed by `refresh`.
    CommitConfirmed,
    RevealBuilt,
    /// Reported by the caller.
    RevealBroadcast,
    /// Reported by the caller or observed by `refresh` (terminal).
    Finalized,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unfunded => "UNFUNDED",
            Self::CommitBuilt => "COMMIT_BUILT",
            Self::CommitBroadcast => "COMMIT_BROADCAST",
            Self::CommitConfirmed => "COMMIT_CONFIRMED",
            Self::RevealBuilt => "REVEAL_BUILT",
            Self::RevealBroadcast => "REVEAL_BROADCAST",
            Self::Finalized => "FINALIZED",
        }
    }

    /// The only state reachable from this one.
    pub fn next(&self) -> Option<SessionState> {
        match self {
            Self::Unfunded => Some(Self::CommitBuilt),
            Self::CommitBuilt => Some(Self::CommitBroadcast),
            Self::CommitBroadcast => Some(Self::CommitConfirmed),
            Self::CommitConfirmed => Some(Self::RevealBuilt),
            Self::RevealBuilt => Some(Self::RevealBroadcast),
            Self::RevealBroadcast => Some(Self::Finalized),
            Self::Finalized => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub from_state: SessionState,
    pub to_state: SessionState,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Funding constraints for a commit beyond the candidate UTXOs themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Outpoints spent first, in order, whether or not they carry a
    /// resource. The first one carries the inscribed satoshi.
    pub mandatory: Vec<OutPoint>,
    /// Resource-carrying outpoints that may be spent as plain funding.
    pub resource_whitelist: Vec<OutPoint>,
}

impl CommitOptions {
    /// Inscribe on the first satoshi of `outpoint`.
    pub fn inscribe_on(outpoint: OutPoint) -> Self {
        Self {
            mandatory: vec![outpoint],
            ..Self::default()
        }
    }

    pub fn allow_resource(mut self, outpoint: OutPoint) -> Self {
        self.resource_whitelist.push(outpoint);
        self
    }
}

/// The unsigned commit transaction and how it was funded.
#[derive(Debug, Clone)]
pub struct CommitTransaction {
    pub transaction: Transaction,
    /// Base64 PSBT with `witness_utxo` set on every input.
    pub psbt: String,
    /// Value of the inscription output: postage plus the estimated reveal fee.
    pub commit_value: Amount,
    pub fee: Amount,
    pub reveal_fee_estimate: Amount,
    pub selection: Selection,
}

impl CommitTransaction {
    pub fn txid(&self) -> Txid {
        self.transaction.compute_txid()
    }
}

/// The signed reveal transaction.
#[derive(Debug, Clone)]
pub struct RevealTransaction {
    pub transaction: Transaction,
    /// Base64 PSBT carrying `final_script_witness`.
    pub psbt: String,
    pub commit_outpoint: OutPoint,
    pub fee: Amount,
}

impl RevealTransaction {
    pub fn txid(&self) -> Txid {
        self.transaction.compute_txid()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One commit/reveal inscription.
#[derive(Debug)]
pub struct InscriptionSession {
    id: SessionId,
    state: SessionState,
    config: BitcoinConfig,
    envelope: InscriptionEnvelope,
    commitment: Option<InscriptionCommitment>,
    commit: Option<CommitTransaction>,
    reveal: Option<RevealTransaction>,
    transition_log: Vec<TransitionRecord>,
}

impl InscriptionSession {
    pub fn new(envelope: InscriptionEnvelope, config: BitcoinConfig) -> Self {
        Self {
            id: SessionId::new(),
            state: SessionState::Unfunded,
            config,
            envelope,
            commitment: None,
            commit: None,
            reveal: None,
            transition_log: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &BitcoinConfig {
        &self.config
    }

    pub fn envelope(&self) -> &InscriptionEnvelope {
        &self.envelope
    }

    pub fn commitment(&self) -> Option<&InscriptionCommitment> {
        self.commitment.as_ref()
    }

    pub fn commit(&self) -> Option<&CommitTransaction> {
        self.commit.as_ref()
    }

    pub fn reveal(&self) -> Option<&RevealTransaction> {
        self.reveal.as_ref()
    }

    pub fn transition_log(&self) -> &[TransitionRecord] {
        &self.transition_log
    }

    // ─── Commit ──────────────────────────────────────────────────────

    /// Build the unsigned commit transaction funded from `utxos`.
    ///
    /// Output 0 pays the Taproot commitment; output 1, when present, is
    /// change to `change_script`.
    pub fn build_commit(
        &mut self,
        utxos: &[Utxo],
        change_script: ScriptBuf,
        fee_rate: f64,
    ) -> Result<&CommitTransaction> {
        self.build_commit_with(utxos, change_script, fee_rate, &CommitOptions::default())
    }

    /// [`Self::build_commit`] with mandatory inputs and a resource whitelist.
    pub fn build_commit_with(
        &mut self,
        utxos: &[Utxo],
        change_script: ScriptBuf,
        fee_rate: f64,
        options: &CommitOptions,
    ) -> Result<&CommitTransaction> {
        self.check_transition(SessionState::CommitBuilt)?;
        if utxos.is_empty() {
            return Err(BitcoinError::NoUtxos);
        }
        let rate = FeeRate::new(fee_rate)?;

        let commitment = InscriptionCommitment::new(&self.envelope, self.config.network)?;
        let commit_script = commitment.script_pubkey();
        let reveal_fee_estimate = rate.fee_for(reveal_vsize(&commitment, &commit_script));
        let commit_value = self
            .config
            .effective_postage()
            .checked_add(reveal_fee_estimate)
            .ok_or_else(|| BitcoinError::InsufficientFunds {
                need: u64::MAX,
                have: saturating_total(utxos),
            })?;

        let mut request = SelectionRequest::new(
            vec![TxOut {
                value: commit_value,
                script_pubkey: commit_script,
            }],
            fee_rate,
            change_script,
        )
        .with_dust_floor(self.config.dust_floor);
        request.mandatory = options.mandatory.clone();
        request.resource_whitelist = options.resource_whitelist.clone();
        let selection = select_utxos(utxos, &request)?;

        let mut output = request.outputs;
        output.extend(selection.change.clone());
        let transaction = Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: selection
                .selected
                .iter()
                .map(|u| unsigned_input(u.outpoint()))
                .collect(),
            output,
        };

        let mut psbt = Psbt::from_unsigned_tx(transaction.clone())?;
        for (input, utxo) in psbt.inputs.iter_mut().zip(&selection.selected) {
            input.witness_utxo = Some(utxo.to_txout());
        }

        let commit = CommitTransaction {
            psbt: psbt.to_string(),
            commit_value,
            fee: selection.fee,
            reveal_fee_estimate,
            selection,
            transaction,
        };
        info!(
            session = %self.id,
            commit_address = %commitment.address(),
            commit_value = commit_value.to_sat(),
            fee = commit.fee.to_sat(),
            inputs = commit.selection.selected.len(),
            "commit transaction built"
        );
        self.commitment = Some(commitment);
        self.transition(SessionState::CommitBuilt)?;
        Ok(&*self.commit.insert(commit))
    }

    /// Fetch funding UTXOs for `funding_address` from `chain` and build the commit.
    pub fn build_commit_from_chain(
        &mut self,
        chain: &dyn ChainData,
        funding_address: &Address,
        change_script: ScriptBuf,
        fee_rate: f64,
    ) -> Result<&CommitTransaction> {
        self.build_commit_from_chain_with(
            chain,
            funding_address,
            change_script,
            fee_rate,
            &CommitOptions::default(),
        )
    }

    /// [`Self::build_commit_from_chain`] with funding constraints.
    pub fn build_commit_from_chain_with(
        &mut self,
        chain: &dyn ChainData,
        funding_address: &Address,
        change_script: ScriptBuf,
        fee_rate: f64,
        options: &CommitOptions,
    ) -> Result<&CommitTransaction> {
        let utxos = chain
            .get_utxos(funding_address)
            .map_err(|source| BitcoinError::Chain {
                step: "commit funding",
                source,
            })?;
        self.build_commit_with(&utxos, change_script, fee_rate, options)
    }

    /// Caller broadcast the commit transaction.
    pub fn mark_commit_broadcast(&mut self, txid: Txid) -> Result<()> {
        self.check_transition(SessionState::CommitBroadcast)?;
        let expected = self.built_commit()?.1.txid();
        check_txid(expected, txid)?;
        self.transition(SessionState::CommitBroadcast)
    }

    /// Caller observed the commit transaction confirm.
    pub fn mark_commit_confirmed(&mut self) -> Result<()> {
        self.transition(SessionState::CommitConfirmed)
    }

    // ─── Reveal ──────────────────────────────────────────────────────

    /// Build and sign the reveal spending the commit output found in
    /// `commit_tx_bytes`, paying `recipient`.
    pub fn build_reveal(
        &mut self,
        commit_tx_bytes: &[u8],
        recipient: ScriptBuf,
        fee_rate: f64,
    ) -> Result<&RevealTransaction> {
        self.check_transition(SessionState::RevealBuilt)?;
        let rate = FeeRate::new(fee_rate)?;
        let commit_tx: Transaction = consensus::deserialize(commit_tx_bytes)?;
        let (commitment, built) = self.built_commit()?;

        let commit_txid = commit_tx.compute_txid();
        let commit_script = commitment.script_pubkey();
        let vout = commit_tx
            .output
            .iter()
            .position(|o| o.script_pubkey == commit_script)
            .ok_or_else(|| BitcoinError::CommitOutputNotFound {
                txid: commit_txid.to_string(),
            })?;
        check_txid(built.txid(), commit_txid)?;

        let prevout = commit_tx.output[vout].clone();
        let commit_outpoint = OutPoint::new(commit_txid, vout as u32);
        let fee = rate.fee_for(reveal_vsize(commitment, &recipient));
        let dust_floor = self.config.dust_floor;
        let value = prevout
            .value
            .checked_sub(fee)
            .filter(|v| *v >= dust_floor)
            .ok_or_else(|| BitcoinError::BelowDust {
                value: prevout.value.to_sat().saturating_sub(fee.to_sat()),
                dust_floor: dust_floor.to_sat(),
            })?;

        let mut transaction = Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![unsigned_input(commit_outpoint)],
            output: vec![TxOut {
                value,
                script_pubkey: recipient,
            }],
        };
        let mut psbt = Psbt::from_unsigned_tx(transaction.clone())?;
        let witness = sign_reveal(commitment, &transaction, &prevout)?;
        psbt.inputs[0].witness_utxo = Some(prevout);
        psbt.inputs[0].final_script_witness = Some(witness.clone());
        transaction.input[0].witness = witness;

        let reveal = RevealTransaction {
            psbt: psbt.to_string(),
            commit_outpoint,
            fee,
            transaction,
        };
        info!(
            session = %self.id,
            commit_outpoint = %commit_outpoint,
            reveal_txid = %reveal.txid(),
            fee = fee.to_sat(),
            "reveal transaction built"
        );
        self.transition(SessionState::RevealBuilt)?;
        Ok(&*self.reveal.insert(reveal))
    }

    /// Fetch the confirmed commit transaction from `chain` and build the reveal.
    pub fn build_reveal_from_chain(
        &mut self,
        chain: &dyn ChainData,
        recipient: ScriptBuf,
        fee_rate: f64,
    ) -> Result<&RevealTransaction> {
        self.check_transition(SessionState::RevealBuilt)?;
        let txid = self.built_commit()?.1.txid();
        let raw = chain
            .get_raw_transaction(&txid)
            .map_err(|source| BitcoinError::Chain {
                step: "reveal input lookup",
                source,
            })?;
        self.build_reveal(&raw, recipient, fee_rate)
    }

    /// Caller broadcast the reveal transaction.
    pub fn mark_reveal_broadcast(&mut self, txid: Txid) -> Result<()> {
        self.check_transition(SessionState::RevealBroadcast)?;
        let expected = self.built_reveal()?.txid();
        check_txid(expected, txid)?;
        self.transition(SessionState::RevealBroadcast)
    }

    /// Caller observed the reveal transaction confirm.
    pub fn mark_finalized(&mut self) -> Result<()> {
        self.transition(SessionState::Finalized)
    }

    // ─── External state ──────────────────────────────────────────────

    /// Poll `chain` once for the broadcast transaction this session is
    /// waiting on and apply the confirmation transition if it confirmed.
    ///
    /// Returns the new state, or `None` when nothing changed.
    pub fn refresh(&mut self, chain: &dyn ChainData) -> Result<Option<SessionState>> {
        let (txid, step, next) = match self.state {
            SessionState::CommitBroadcast => (
                self.built_commit()?.1.txid(),
                "commit confirmation",
                SessionState::CommitConfirmed,
            ),
            SessionState::RevealBroadcast => (
                self.built_reveal()?.txid(),
                "reveal confirmation",
                SessionState::Finalized,
            ),
            _ => return Ok(None),
        };
        let status = chain
            .get_confirmation_status(&txid)
            .map_err(|source| BitcoinError::Chain { step, source })?;
        if !status.is_confirmed() {
            debug!(session = %self.id, %txid, "still unconfirmed");
            return Ok(None);
        }
        self.transition(next)?;
        Ok(Some(next))
    }

    // ─── Provenance ──────────────────────────────────────────────────

    /// Provenance linking `source_did` to the inscribed satoshi.
    ///
    /// `sat` is the ordinal number of the first satoshi of the reveal
    /// output, as reported by an indexer.
    pub fn provenance(&self, source_did: &str, sat: u64) -> Result<MigrationRecord> {
        if !self.state.is_terminal() {
            return Err(BitcoinError::InvalidTransition {
                from: self.state.to_string(),
                to: SessionState::Finalized.to_string(),
                reason: "provenance requires a finalized session".into(),
            });
        }
        let source = Did::parse(source_did)?;
        let commit_txid = self.built_commit()?.1.txid();
        let reveal_txid = self.built_reveal()?.txid();
        let target = BtcoDid::new(self.config.network, sat);
        info!(
            session = %self.id,
            source = %source,
            target = %target,
            "migration provenance recorded"
        );
        Ok(MigrationRecord {
            session_id: self.id,
            source_did: source.to_string(),
            target_did: target,
            inscription_id: inscription_id(&reveal_txid),
            commit_txid: commit_txid.to_string(),
            reveal_txid: reveal_txid.to_string(),
            payload_digest: payload_digest(self.envelope.body()).to_string(),
            timestamp: Timestamp::now(),
        })
    }

    // ─── Internals ───────────────────────────────────────────────────

    fn check_transition(&self, to: SessionState) -> Result<()> {
        if self.state.next() == Some(to) {
            return Ok(());
        }
        let reason = match self.state.next() {
            Some(expected) => format!("next state is {expected}"),
            None => "session is finalized".to_string(),
        };
        Err(BitcoinError::InvalidTransition {
            from: self.state.to_string(),
            to: to.to_string(),
            reason,
        })
    }

    fn transition(&mut self, to: SessionState) -> Result<()> {
        self.check_transition(to)?;
        info!(session = %self.id, from = %self.state, to = %to, "inscription state transition");
        self.transition_log.push(TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: Timestamp::now(),
        });
        self.state = to;
        Ok(())
    }

    fn built_commit(&self) -> Result<(&InscriptionCommitment, &CommitTransaction)> {
        match (&self.commitment, &self.commit) {
            (Some(commitment), Some(commit)) => Ok((commitment, commit)),
            _ => Err(self.missing("no commit transaction has been built")),
        }
    }

    fn built_reveal(&self) -> Result<&RevealTransaction> {
        self.reveal
            .as_ref()
            .ok_or_else(|| self.missing("no reveal transaction has been built"))
    }

    fn missing(&self, reason: &str) -> BitcoinError {
        BitcoinError::InvalidTransition {
            from: self.state.to_string(),
            to: self
                .state
                .next()
                .map(|s| s.to_string())
                .unwrap_or_else(|| self.state.to_string()),
            reason: reason.to_string(),
        }
    }
}

fn unsigned_input(previous_output: OutPoint) -> TxIn {
    TxIn {
        previous_output,
        script_sig: ScriptBuf::new(),
        sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
        witness: Witness::new(),
    }
}

fn check_txid(expected: Txid, actual: Txid) -> Result<()> {
    if expected != actual {
        return Err(BitcoinError::TxidMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Script-path witness: `<signature> <reveal script> <control block>`.
fn reveal_witness(commitment: &InscriptionCommitment, signature: &[u8]) -> Witness {
    let mut witness = Witness::new();
    witness.push(signature);
    witness.push(commitment.reveal_script().as_bytes());
    witness.push(commitment.control_block().serialize());
    witness
}

/// Exact vsize of a reveal paying `recipient`, using a placeholder
/// signature of the real length.
pub(crate) fn reveal_vsize(commitment: &InscriptionCommitment, recipient: &Script) -> usize {
    let mut input = unsigned_input(OutPoint::null());
    input.witness = reveal_witness(commitment, &[0u8; 64]);
    Transaction {
        version: transaction::Version::TWO,
        lock_time: absolute::LockTime::ZERO,
        input: vec![input],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: recipient.to_owned(),
        }],
    }
    .vsize()
}

fn sign_reveal(
    commitment: &InscriptionCommitment,
    unsigned: &Transaction,
    prevout: &TxOut,
) -> Result<Witness> {
    if !verify_commitment(
        &prevout.script_pubkey,
        &commitment.reveal_public_key(),
        commitment.reveal_script(),
        commitment.control_block(),
    ) {
        return Err(BitcoinError::Taproot(
            "commit output does not match the reveal script".into(),
        ));
    }
    let prevouts = [prevout.clone()];
    let sighash = SighashCache::new(unsigned)
        .taproot_script_spend_signature_hash(
            0,
            &Prevouts::All(&prevouts),
            commitment.leaf_hash(),
            TapSighashType::Default,
        )
        .map_err(|e| BitcoinError::Sighash(e.to_string()))?;
    let message = Message::from_digest(sighash.to_byte_array());
    let signature = Secp256k1::new().sign_schnorr(&message, commitment.keypair());
    Ok(reveal_witness(commitment, &signature.serialize()))
}
