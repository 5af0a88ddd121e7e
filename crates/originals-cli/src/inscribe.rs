//! # Inscribe Subcommand
//!
//! Builds the commit half of an inscription. Signing and broadcasting are
//! left to the caller's wallet; the commit PSBT is printed along with the
//! reveal script, public key and control block so the reveal can be
//! reconstructed and checked.
//!
//! The UTXO file is a JSON array of
//! `{"txid", "vout", "value", "script_pubkey", "has_resource"?, "locked"?}`
//! with `value` in satoshis and `script_pubkey` in hex.
//!
//! `--inscribe-on <txid:vout>` spends that outpoint as the first input so the
//! inscription lands on its first satoshi, even when it carries a resource.
//! `--allow-resource <txid:vout>` lets other resource-carrying outpoints fund
//! the commit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use originals_bitcoin::bitcoin::OutPoint;
use originals_bitcoin::{
    BitcoinConfig, CommitOptions, InscriptionEnvelope, InscriptionSession, Network, Utxo,
};
use serde_json::{json, Value};

/// Arguments for `originals inscribe`.
#[derive(Args, Debug)]
pub struct InscribeArgs {
    #[command(subcommand)]
    pub command: InscribeCommand,
}

/// Inscribe subcommands.
#[derive(Subcommand, Debug)]
pub enum InscribeCommand {
    /// Build an unsigned commit transaction for a payload.
    Commit(CommitArgs),
}

/// Arguments for `originals inscribe commit`.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// File holding the inscription body.
    #[arg(long)]
    pub payload: PathBuf,
    #[arg(long, default_value = "application/json")]
    pub content_type: String,
    /// JSON file listing the funding UTXOs.
    #[arg(long)]
    pub utxos: PathBuf,
    #[arg(long)]
    pub change_address: String,
    /// sat/vB. Overrides ORIGINALS_FEE_RATE.
    #[arg(long)]
    pub fee_rate: Option<f64>,
    /// Overrides ORIGINALS_NETWORK.
    #[arg(long)]
    pub network: Option<Network>,
    /// Outpoint whose first satoshi receives the inscription.
    #[arg(long, value_name = "TXID:VOUT")]
    pub inscribe_on: Option<OutPoint>,
    /// Resource-carrying outpoints that may be spent as funding.
    #[arg(long, value_name = "TXID:VOUT")]
    pub allow_resource: Vec<OutPoint>,
}

/// Execute the inscribe subcommand.
pub fn run_inscribe(args: &InscribeArgs) -> Result<u8> {
    let output = match &args.command {
        InscribeCommand::Commit(commit) => {
            let config = BitcoinConfig::from_env().context("invalid bitcoin configuration")?;
            cmd_commit(commit, config)?
        }
    };
    crate::print_json(&output)?;
    Ok(0)
}

fn cmd_commit(args: &CommitArgs, mut config: BitcoinConfig) -> Result<Value> {
    if let Some(network) = args.network {
        config.network = network;
    }
    if let Some(rate) = args.fee_rate {
        config = config.with_fee_rate(rate)?;
    }
    let change = config.parse_address(&args.change_address)?;

    let body = std::fs::read(&args.payload)
        .with_context(|| format!("failed to read payload: {}", args.payload.display()))?;
    let utxos = read_utxos(&args.utxos)?;

    let envelope = InscriptionEnvelope::new(args.content_type.as_str(), body)?;
    let fee_rate = config.fee_rate;
    let mut session = InscriptionSession::new(envelope, config);
    let options = CommitOptions {
        mandatory: args.inscribe_on.into_iter().collect(),
        resource_whitelist: args.allow_resource.clone(),
    };
    let commit = session
        .build_commit_with(&utxos, change.script_pubkey(), fee_rate, &options)?
        .clone();
    let commitment = session
        .commitment()
        .context("session has no commitment after building the commit")?;

    Ok(json!({
        "sessionId": session.id(),
        "state": session.state().as_str(),
        "commitAddress": commitment.address().to_string(),
        "commitTxid": commit.txid().to_string(),
        "commitPsbt": commit.psbt,
        "commitValue": commit.commit_value.to_sat(),
        "fee": commit.fee.to_sat(),
        "revealFeeEstimate": commit.reveal_fee_estimate.to_sat(),
        "changeValue": commit.selection.change_value().to_sat(),
        "inputs": commit.selection.selected.len(),
        "inscribedOutpoint": commit.transaction.input[0].previous_output.to_string(),
        "revealScript": hex::encode(commitment.reveal_script().as_bytes()),
        "revealPublicKey": commitment.reveal_public_key().to_string(),
        "controlBlock": hex::encode(commitment.control_block().serialize()),
    }))
}

fn read_utxos(path: &Path) -> Result<Vec<Utxo>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read UTXO file: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed UTXO file: {}", path.display()))
}
