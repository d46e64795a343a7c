//! Command-line interface for drop-ingest
//!
//! Provides `scan`, `pick`, `replay` and `upload` subcommands that drive an
//! ingestion session the same way a drop target or native picker would.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod pick;
mod replay;
mod scan;
mod upload;
mod utils;

/// Turn dropped or picked files and folders into a deduplicated upload manifest
#[derive(Parser)]
#[command(name = "drop-ingest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Treat the given paths as one drop and print the resulting manifest
    Scan(scan::ScanArgs),

    /// Treat the given paths as a native picker selection
    Pick(pick::PickArgs),

    /// Replay a recorded drop payload (JSON) and print the manifest
    Replay(replay::ReplayArgs),

    /// Drop the given paths and upload them into a destination directory
    Upload(upload::UploadArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Scan(args) => scan::run(args).await,
            Commands::Pick(args) => pick::run(args),
            Commands::Replay(args) => replay::run(args).await,
            Commands::Upload(args) => upload::run(args).await,
        }
    })
}
