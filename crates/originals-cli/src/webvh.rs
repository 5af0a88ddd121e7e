//! # Webvh Subcommand
//!
//! `did:webvh` version logs on disk.
//!
//! ## Commands
//!
//! - `create --domain <d> --path <seg>... [--key <file>] [--out <dir>]`:
//!   writes the genesis log to `<out>/<domain>/<seg>.../did.jsonl`.
//! - `update --log <file> [--key <file>] [--state <json>] [--rotate <mk>...] [--deactivate]`
//! - `validate <file>`
//! - `locate --domain <d> --path <seg>...`
//! - `pointer <file>`: the inscription payload for the latest version.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use originals_core::{validate_domain, validate_path_segments};
use originals_webvh::{
    create, log_path, log_url, update, validate, CreateOptions, CryptosuiteRegistry, DidLog,
    DocumentPointer, KeyProviderSigner, LogUpdate, ValidatedLog, VerificationMethodRegistry,
};
use serde_json::{json, Value};

/// Arguments for `originals webvh`.
#[derive(Args, Debug)]
pub struct WebvhArgs {
    #[command(subcommand)]
    pub command: WebvhCommand,
}

/// Webvh subcommands.
#[derive(Subcommand, Debug)]
pub enum WebvhCommand {
    /// Create a new identifier and write its genesis log.
    Create {
        /// Host the log is served from (port colons allowed).
        #[arg(long)]
        domain: String,
        /// Path segments after the domain.
        #[arg(long = "path", num_args = 1..)]
        path: Vec<String>,
        /// Hex seed file. Defaults to ORIGINALS_SIGNING_KEY.
        #[arg(long)]
        key: Option<PathBuf>,
        /// Root directory for the document location.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Allow the identifier to move later.
        #[arg(long)]
        portable: bool,
        /// Resolver cache hint in seconds.
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Append a signed entry to an existing log.
    Update {
        #[arg(long)]
        log: PathBuf,
        #[arg(long)]
        key: Option<PathBuf>,
        /// File holding the replacement DID document.
        #[arg(long)]
        state: Option<PathBuf>,
        /// New update keys (multikeys).
        #[arg(long = "rotate", num_args = 1..)]
        rotate: Vec<String>,
        /// Permanently deactivate the identifier.
        #[arg(long)]
        deactivate: bool,
    },

    /// Validate a log and print its summary.
    Validate { log: PathBuf },

    /// Print the storage path and resolution URL for a domain and path.
    Locate {
        #[arg(long)]
        domain: String,
        #[arg(long = "path", num_args = 1..)]
        path: Vec<String>,
    },

    /// Print the document pointer for the latest version of a log.
    Pointer { log: PathBuf },
}

/// Execute the webvh subcommand.
pub fn run_webvh(args: &WebvhArgs) -> Result<u8> {
    let output = match &args.command {
        WebvhCommand::Create {
            domain,
            path,
            key,
            out,
            portable,
            ttl,
        } => cmd_create(domain, path, key.as_deref(), out, *portable, *ttl)?,
        WebvhCommand::Update {
            log,
            key,
            state,
            rotate,
            deactivate,
        } => cmd_update(log, key.as_deref(), state.as_deref(), rotate, *deactivate)?,
        WebvhCommand::Validate { log } => summary(&load_validated(log)?.1),
        WebvhCommand::Locate { domain, path } => cmd_locate(domain, path)?,
        WebvhCommand::Pointer { log } => {
            let (_, validated) = load_validated(log)?;
            serde_json::to_value(DocumentPointer::from_validated(&validated)?)?
        }
    };
    crate::print_json(&output)?;
    Ok(0)
}

fn cmd_create(
    domain: &str,
    path: &[String],
    key: Option<&Path>,
    out: &Path,
    portable: bool,
    ttl: Option<u64>,
) -> Result<Value> {
    // Reject bad input before reading keys or touching the output tree.
    validate_path_segments(path)?;
    validate_domain(domain)?;

    let signer = KeyProviderSigner::from_boxed(crate::load_key_provider(key)?);
    let created = create(
        domain,
        path,
        &signer,
        CreateOptions {
            portable,
            ttl,
            ..CreateOptions::default()
        },
    )?;

    let file = out.join(created.did.log_path()?);
    if file.exists() {
        bail!("refusing to overwrite existing log: {}", file.display());
    }
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(&file, created.log.to_jsonl()?)
        .with_context(|| format!("failed to write log: {}", file.display()))?;

    let genesis = created.genesis().context("created log has no genesis entry")?;
    Ok(json!({
        "did": created.did.to_string(),
        "scid": created.scid,
        "versionId": genesis.version_id,
        "logFile": file.display().to_string(),
        "url": created.did.log_url()?,
    }))
}

fn cmd_update(
    file: &Path,
    key: Option<&Path>,
    state: Option<&Path>,
    rotate: &[String],
    deactivate: bool,
) -> Result<Value> {
    let (mut log, _) = load_validated(file)?;
    let state = state
        .map(|p| -> Result<Value> {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read state: {}", p.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("state is not JSON: {}", p.display()))
        })
        .transpose()?;

    let signer = KeyProviderSigner::from_boxed(crate::load_key_provider(key)?);
    let changes = LogUpdate {
        state,
        update_keys: (!rotate.is_empty()).then(|| rotate.to_vec()),
        deactivate,
        ..LogUpdate::default()
    };
    let version_id = update(&mut log, changes, &signer)?.version_id.clone();

    std::fs::write(file, log.to_jsonl()?)
        .with_context(|| format!("failed to write log: {}", file.display()))?;
    Ok(json!({
        "versionId": version_id,
        "entries": log.len(),
        "deactivated": deactivate,
    }))
}

fn cmd_locate(domain: &str, path: &[String]) -> Result<Value> {
    Ok(json!({
        "path": log_path(domain, path)?.display().to_string(),
        "url": log_url(domain, path)?,
    }))
}

/// Read and validate a log file against the default registries.
fn load_validated(file: &Path) -> Result<(DidLog, ValidatedLog)> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read log: {}", file.display()))?;
    let log = DidLog::from_jsonl(&raw).with_context(|| format!("malformed log: {}", file.display()))?;
    let validated = validate(
        &log,
        &VerificationMethodRegistry::new(),
        &CryptosuiteRegistry::default(),
    )
    .with_context(|| format!("invalid log: {}", file.display()))?;
    Ok((log, validated))
}

fn summary(validated: &ValidatedLog) -> Value {
    json!({
        "valid": true,
        "did": validated.did.to_string(),
        "scid": validated.scid,
        "versionId": validated.version_id,
        "versionTime": validated.version_time.to_string(),
        "entries": validated.entry_count,
        "parameters": validated.parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use originals_crypto::SigningKey;

    fn key_file(dir: &Path, seed: u8) -> PathBuf {
        let path = dir.join(format!("key-{seed}.hex"));
        std::fs::write(&path, SigningKey::from_seed(&[seed; 32]).to_seed_hex().as_str()).unwrap();
        path
    }

    fn segs(s: &[&str]) -> Vec<String> {
        s.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn create_writes_log_at_document_location() {
        let dir = tempfile::tempdir().unwrap();
        let key = key_file(dir.path(), 1);
        let out = cmd_create("example.com", &segs(&["alice"]), Some(&key), dir.path(), false, None)
            .unwrap();

        let file = dir.path().join("example.com/alice/did.jsonl");
        assert!(file.exists());
        assert_eq!(out["logFile"], file.display().to_string());
        assert_eq!(out["url"], "https://example.com/alice/did.jsonl");
        assert!(out["did"].as_str().unwrap().ends_with(":example.com:alice"));

        let (_, validated) = load_validated(&file).unwrap();
        assert_eq!(validated.entry_count, 1);
        assert_eq!(summary(&validated)["scid"], out["scid"]);

        // A second create at the same location is refused.
        assert!(cmd_create("example.com", &segs(&["alice"]), Some(&key), dir.path(), false, None).is_err());
    }

    #[test]
    fn traversal_segment_is_rejected_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let missing_key = dir.path().join("no-such-key");
        let err = cmd_create("example.com", &segs(&["..", "etc"]), Some(&missing_key), dir.path(), false, None)
            .unwrap_err();
        assert!(err.to_string().contains("invalid path segment"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn update_rotate_and_deactivate() {
        let dir = tempfile::tempdir().unwrap();
        let key1 = key_file(dir.path(), 1);
        let key2 = key_file(dir.path(), 2);
        cmd_create("example.com", &segs(&["bob"]), Some(&key1), dir.path(), false, None).unwrap();
        let file = dir.path().join("example.com/bob/did.jsonl");

        let next = SigningKey::from_seed(&[2; 32]).verifying_key().to_multikey();
        let out = cmd_update(&file, Some(&key1), None, &[next], false).unwrap();
        assert!(out["versionId"].as_str().unwrap().starts_with("2-"));

        // The rotated-out key can no longer sign.
        assert!(cmd_update(&file, Some(&key1), None, &[], false).is_err());

        let state_file = dir.path().join("state.json");
        let (_, current) = load_validated(&file).unwrap();
        let mut doc = current.document.clone();
        doc["alsoKnownAs"] = json!(["https://bob.example"]);
        std::fs::write(&state_file, doc.to_string()).unwrap();
        cmd_update(&file, Some(&key2), Some(&state_file), &[], false).unwrap();
        let (_, current) = load_validated(&file).unwrap();
        assert_eq!(current.document["alsoKnownAs"][0], "https://bob.example");

        let out = cmd_update(&file, Some(&key2), None, &[], true).unwrap();
        assert_eq!(out["entries"], 4);
        assert!(cmd_update(&file, Some(&key2), None, &[], false).is_err());
        let (_, last) = load_validated(&file).unwrap();
        assert!(last.parameters.deactivated);
    }

    #[test]
    fn tampered_log_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let key = key_file(dir.path(), 3);
        cmd_create("example.com", &[], Some(&key), dir.path(), false, None).unwrap();
        let file = dir.path().join("example.com/did.jsonl");
        let log = DidLog::from_jsonl(&std::fs::read_to_string(&file).unwrap()).unwrap();
        let mut entries = log.entries().to_vec();
        entries[0].state["alsoKnownAs"] = json!(["https://mallory.example"]);
        std::fs::write(&file, DidLog::from_entries(entries).to_jsonl().unwrap()).unwrap();
        let err = load_validated(&file).unwrap_err();
        assert!(format!("{err:#}").contains("invalid log"));
    }

    #[test]
    fn locate_paths() {
        let out = cmd_locate("localhost:8080", &segs(&["a", "b"])).unwrap();
        assert_eq!(out["path"], "localhost_8080/a/b/did.jsonl");
        assert_eq!(out["url"], "https://localhost:8080/a/b/did.jsonl");
        let out = cmd_locate("example.com", &[]).unwrap();
        assert_eq!(out["url"], "https://example.com/.well-known/did.jsonl");
    }
}
