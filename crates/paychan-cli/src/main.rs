//! Paychan CLI: keys, deterministic addresses, promises and an in-memory
//! protocol simulation.
//!
//! Subcommands: init, keygen, address, sign-promise, recover-promise, simulate.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Paychan: hub-and-spoke payment channels.
#[derive(Parser, Debug)]
#[command(name = "paychan", version, about, long_about = None)]
struct Cli {
    /// Path to the protocol configuration (TOML). Defaults apply when missing.
    #[arg(short, long, global = true, default_value = "paychan.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default protocol configuration.
    Init(commands::init::InitArgs),
    /// Generate a secp256k1 key pair.
    Keygen(commands::keygen::KeygenArgs),
    /// Derive the deterministic address of a channel or accountant.
    Address(commands::address::AddressArgs),
    /// Sign a payment promise.
    SignPromise(commands::promise::SignArgs),
    /// Recover the signer of a payment promise.
    RecoverPromise(commands::promise::RecoverArgs),
    /// Run a full registration and settlement flow on an in-memory ledger.
    Simulate(commands::simulate::SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Address(args) => commands::address::run(args, &cli.config),
        Commands::SignPromise(args) => commands::promise::sign(args),
        Commands::RecoverPromise(args) => commands::promise::recover(args),
        Commands::Simulate(args) => commands::simulate::run(args, &cli.config),
    }
}
