//! # Keygen Subcommand
//!
//! Generates an Ed25519 key pair. The seed is printed as hex (or written to
//! `--out`); the public key as a multikey and a `did:key`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use originals_crypto::SigningKey;
use serde_json::{json, Value};

/// Arguments for `originals keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Write the hex seed to this file instead of printing it.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute the keygen subcommand.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let summary = cmd_keygen(args.out.as_deref())?;
    crate::print_json(&summary)?;
    Ok(0)
}

fn cmd_keygen(out: Option<&std::path::Path>) -> Result<Value> {
    let key = SigningKey::generate();
    let public = key.verifying_key();
    let mut summary = json!({
        "multikey": public.to_multikey(),
        "didKey": public.to_did_key(),
    });
    match out {
        Some(path) => {
            if path.exists() {
                bail!("refusing to overwrite existing key file: {}", path.display());
            }
            std::fs::write(path, format!("{}\n", key.to_seed_hex().as_str()))
                .with_context(|| format!("failed to write key file: {}", path.display()))?;
            summary["keyFile"] = json!(path.display().to_string());
        }
        None => {
            summary["seed"] = json!(key.to_seed_hex().as_str());
        }
    }
    Ok(summary)
}
