//! Pick command: simulate the native file or folder picker

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::utils::{ensure_exists, print_manifest, print_report, resolve_config};
use super::utils::{IngestArgs, OutputArgs};
use crate::ingest::picker::{pick_files, pick_folder, PickedFile};
use crate::session::IngestionController;

#[derive(Args, Debug)]
pub struct PickArgs {
    /// Files to pick, or folders when --folder is given
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Use the folder picker: every file beneath each folder, with its path
    #[arg(long)]
    pub folder: bool,

    #[command(flatten)]
    pub ingest: IngestArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn run(args: PickArgs) -> Result<()> {
    for path in &args.paths {
        ensure_exists(path)?;
    }
    let config = resolve_config(&args.ingest)?;
    let controller = IngestionController::new(config.settings());

    let picked: Vec<PickedFile> = if args.folder {
        let mut all = Vec::new();
        for folder in &args.paths {
            all.extend(pick_folder(folder, config.follow_symlinks)?);
        }
        all
    } else {
        pick_files(&args.paths)?
    };
    tracing::debug!("Picker returned {} file(s)", picked.len());

    let report = controller.ingest_picker(&picked)?;
    print_report(&report);

    print_manifest(&controller.selection(), controller.mode(), &args.output)
}
