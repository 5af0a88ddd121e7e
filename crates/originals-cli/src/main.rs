//! # originals CLI entry point
//!
//! Parses arguments, installs the tracing subscriber and dispatches to the
//! subcommand handlers in the library half of this crate.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use originals_cli::inscribe::{run_inscribe, InscribeArgs};
use originals_cli::keygen::{run_keygen, KeygenArgs};
use originals_cli::webvh::{run_webvh, WebvhArgs};

/// Originals identity and settlement toolchain.
///
/// Creates and validates `did:webvh` version logs and builds the Bitcoin
/// inscription commit that migrates a document pointer on-chain.
#[derive(Parser, Debug)]
#[command(name = "originals", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 signing key.
    Keygen(KeygenArgs),

    /// Create, update and validate did:webvh logs.
    Webvh(WebvhArgs),

    /// Build Bitcoin inscription transactions.
    Inscribe(InscribeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "originals CLI starting");

    let result = match cli.command {
        Commands::Keygen(args) => run_keygen(&args),
        Commands::Webvh(args) => run_webvh(&args),
        Commands::Inscribe(args) => run_inscribe(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
