//! Replay command: feed a recorded drop payload through a session

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::{ensure_exists, print_manifest, print_report, resolve_config};
use super::utils::{IngestArgs, OutputArgs};
use crate::ingest::memory::RecordedDrop;
use crate::session::IngestionController;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Recorded drops (JSON), ingested in order into one session
    #[arg(required = true, value_name = "FILE")]
    pub recordings: Vec<PathBuf>,

    #[command(flatten)]
    pub ingest: IngestArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(args: ReplayArgs) -> Result<()> {
    let config = resolve_config(&args.ingest)?;
    let controller = IngestionController::new(config.settings());

    for recording in &args.recordings {
        ensure_exists(recording)?;
        let raw = tokio::fs::read_to_string(recording)
            .await
            .with_context(|| format!("Failed to read {}", recording.display()))?;
        let recorded: RecordedDrop = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid recorded drop: {}", recording.display()))?;

        let report = controller.ingest_drop(&recorded.into_payload()).await?;
        if report.degraded {
            eprintln!("{}: no structured entries, used the flat file list", recording.display());
        }
        print_report(&report);
    }

    print_manifest(&controller.selection(), controller.mode(), &args.output)
}
