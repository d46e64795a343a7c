//! Shared CLI utilities.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::{Config, ContentHandle, UploadMode};
use crate::ingest::fs::{FsEntry, FsOptions};
use crate::ingest::reconcile::{DropItem, DropPayload, FlatFile};
use crate::ingest::selection::SelectionSet;
use crate::render::{render_manifest, ManifestFormat};
use crate::session::IngestReport;

/// Options shared by every ingesting subcommand.
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Path to config file (drop-ingest.toml or .drop-ingest.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Upload mode: 'file' rejects folder structure, 'folder' accepts it
    #[arg(short = 'm', long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Extra artifact file names to discard (comma-separated)
    #[arg(long, value_name = "NAMES")]
    pub artifact: Option<String>,

    /// Extra artifact leaf-name globs to discard (comma-separated)
    #[arg(long, value_name = "GLOBS")]
    pub artifact_glob: Option<String>,

    /// Directory entries returned per listing page
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Maximum traversal tasks in flight
    #[arg(long, value_name = "N")]
    pub max_in_flight: Option<usize>,

    /// Follow symbolic links when walking folders
    #[arg(long)]
    pub follow_symlinks: bool,
}

/// Options controlling how the manifest is printed.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Manifest format: json, jsonl or text
    #[arg(short = 'f', long, value_name = "FORMAT", default_value = "json")]
    pub format: String,

    /// Omit the generation timestamp from JSON manifests
    #[arg(long)]
    pub no_timestamp: bool,
}

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Load the config file (explicit or discovered in the working directory)
/// and apply command-line overrides.
pub fn resolve_config(args: &IngestArgs) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let config = load_config(&cwd, args.config.as_deref())?;

    let mode = args.mode.as_deref().map(str::parse::<UploadMode>).transpose()?;
    let overrides = CliOverrides {
        mode,
        page_size: args.page_size,
        max_in_flight: args.max_in_flight,
        artifact_names: parse_csv(&args.artifact),
        artifact_globs: parse_csv(&args.artifact_glob),
        follow_symlinks: args.follow_symlinks,
    };
    Ok(merge_cli_with_config(config, &overrides))
}

/// Build a drop payload from local paths: every path is an item with a
/// filesystem entry, and the flat list mirrors it the way platforms do
/// (directories appear as empty placeholder files).
pub async fn drop_from_paths(paths: &[PathBuf], options: FsOptions) -> Result<DropPayload> {
    let mut payload = DropPayload::default();
    for path in paths {
        let entry = FsEntry::open(path, options)
            .await
            .with_context(|| format!("Cannot drop {}", path.display()))?;
        let size_bytes = match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => m.len(),
            _ => 0,
        };
        payload.files.push(FlatFile::new(
            entry.name().to_string(),
            size_bytes,
            ContentHandle::Path(path.clone()),
        ));
        payload.items.push(DropItem::entry(entry));
    }
    Ok(payload)
}

pub fn print_report(report: &IngestReport) {
    eprintln!(
        "Ingested {} file(s): {} duplicate(s), {} artifact(s) discarded, {} fallback(s)",
        report.accepted, report.duplicates, report.artifacts, report.fallbacks
    );
    let failures = report.traversal.leaf_failures + report.traversal.directory_failures;
    if failures > 0 {
        eprintln!("Warning: {} unreadable entr(y/ies) skipped", failures);
    }
}

pub fn print_manifest(selection: &SelectionSet, mode: UploadMode, output: &OutputArgs) -> Result<()> {
    let format: ManifestFormat = output.format.parse()?;
    let rendered = render_manifest(selection, mode, format, !output.no_timestamp)?;
    if rendered.ends_with('\n') {
        print!("{}", rendered);
    } else {
        println!("{}", rendered);
    }
    Ok(())
}

pub fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }
    Ok(())
}
