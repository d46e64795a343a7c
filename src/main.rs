//! drop-ingest: turn dropped or picked files and folders into an upload selection
//!
//! This tool walks dropped folders, discards OS artifacts, deduplicates the
//! result and either prints a manifest or uploads it into a destination.

use anyhow::Result;

fn main() -> Result<()> {
    drop_ingest::cli::run()
}
