//! # originals-cli: Command-Line Interface
//!
//! The `originals` binary. The only component of the workspace that touches
//! the filesystem: it reads keys, payloads and UTXO sets, and reads and
//! writes `did.jsonl` logs at their document location.
//!
//! ## Subcommands
//!
//! - `originals keygen`: Ed25519 key pair (hex seed + multikey).
//! - `originals webvh create|update|validate|locate|pointer`: version logs.
//! - `originals inscribe commit`: build an inscription commit PSBT.
//!
//! Handlers return `anyhow::Result<u8>` (the process exit code) and print
//! JSON to stdout. Logs go to stderr.

pub mod inscribe;
pub mod keygen;
pub mod webvh;

use std::path::Path;

use anyhow::{Context, Result};
use originals_crypto::{EnvKeyProvider, KeyProvider, LocalKeyProvider, SigningKey};
use serde_json::Value;

/// Load a signing key from a hex seed file, or from `ORIGINALS_SIGNING_KEY`
/// when no file is given.
pub fn load_key_provider(key: Option<&Path>) -> Result<Box<dyn KeyProvider>> {
    match key {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read key file: {}", path.display()))?;
            let key = SigningKey::from_hex(raw.trim())
                .with_context(|| format!("invalid key file: {}", path.display()))?;
            Ok(Box::new(LocalKeyProvider::new(key)))
        }
        None => Ok(Box::new(
            EnvKeyProvider::from_default_env().context("no --key given and no key in the environment")?,
        )),
    }
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
