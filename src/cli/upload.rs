//! Upload command: drop local paths and hand the selection to an uploader

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use super::utils::{drop_from_paths, ensure_exists, print_report, resolve_config, IngestArgs};
use crate::render::ManifestFormat;
use crate::session::{IngestionController, SessionState, PROGRESS_DONE};
use crate::upload::{DirectoryUploader, ManifestUploader, Uploader};

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Files and folders to drop
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Copy the selection into this directory, preserving folder structure
    #[arg(short = 'd', long, value_name = "DIR", required_unless_present = "manifest")]
    pub dest: Option<PathBuf>,

    /// Write the selection as a manifest file instead of copying bytes
    #[arg(long, value_name = "FILE", conflicts_with = "dest")]
    pub manifest: Option<PathBuf>,

    /// Manifest format when --manifest is used: json, jsonl or text
    #[arg(short = 'f', long, value_name = "FORMAT", default_value = "json")]
    pub format: String,

    /// Hide the progress bar
    #[arg(short = 'q', long)]
    pub quiet: bool,

    #[command(flatten)]
    pub ingest: IngestArgs,
}

pub async fn run(args: UploadArgs) -> Result<()> {
    for path in &args.paths {
        ensure_exists(path)?;
    }
    let config = resolve_config(&args.ingest)?;
    let controller = IngestionController::new(config.settings());

    let payload = drop_from_paths(&args.paths, config.fs_options()).await?;
    let report = controller.ingest_drop(&payload).await?;
    print_report(&report);

    let uploader: Box<dyn Uploader> = match (&args.dest, &args.manifest) {
        (_, Some(manifest)) => {
            let format: ManifestFormat = args.format.parse()?;
            Box::new(ManifestUploader::new(manifest, controller.mode()).format(format))
        }
        (Some(dest), None) => Box::new(DirectoryUploader::new(dest)),
        (None, None) => anyhow::bail!("Either --dest or --manifest is required"),
    };

    let bar = if args.quiet { ProgressBar::hidden() } else { ProgressBar::new(PROGRESS_DONE as u64) };
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos:>3}% {msg}")?);
    let selected = controller.status().selected;
    bar.set_message(format!("{} file(s)", selected));

    let mut updates = controller.subscribe();
    let watcher = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let status = *updates.borrow_and_update();
                bar.set_position(status.progress as u64);
                if status.state != SessionState::Uploading {
                    break;
                }
            }
        })
    };

    let result = controller.confirm_upload(uploader.as_ref()).await;
    watcher.abort();

    match result {
        Ok(()) => {
            bar.set_position(PROGRESS_DONE as u64);
            bar.finish_with_message("done");
            eprintln!("Uploaded {} file(s)", selected);
            Ok(())
        }
        Err(err) => {
            bar.abandon_with_message("failed");
            Err(err.into())
        }
    }
}
