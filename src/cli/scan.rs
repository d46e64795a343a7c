//! Scan command: treat local paths as a single drop

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::utils::{drop_from_paths, ensure_exists, print_manifest, print_report, resolve_config};
use super::utils::{IngestArgs, OutputArgs};
use crate::session::IngestionController;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Files and folders to drop
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub ingest: IngestArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(args: ScanArgs) -> Result<()> {
    for path in &args.paths {
        ensure_exists(path)?;
    }
    let config = resolve_config(&args.ingest)?;
    let controller = IngestionController::new(config.settings());

    let payload = drop_from_paths(&args.paths, config.fs_options()).await?;
    let report = controller.ingest_drop(&payload).await?;
    print_report(&report);

    print_manifest(&controller.selection(), controller.mode(), &args.output)
}
