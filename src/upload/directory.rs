//! Copy the selection into a destination directory

use super::Uploader;
use crate::domain::ContentHandle;
use crate::ingest::selection::SelectionSet;
use crate::session::ProgressReporter;
use crate::utils::safe_relative_path;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Writes every descriptor under `root` at its identity key, reporting
/// progress by bytes written.
pub struct DirectoryUploader {
    root: PathBuf,
}

impl DirectoryUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Uploader for DirectoryUploader {
    async fn upload(&self, files: &SelectionSet, progress: ProgressReporter) -> Result<()> {
        let total = files.total_bytes();
        let mut done = 0u64;

        for descriptor in files {
            let key = descriptor.identity_key();
            let relative = safe_relative_path(key)
                .with_context(|| format!("Refusing to write outside destination: {}", key))?;
            let target = self.root.join(relative);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }

            match &descriptor.content {
                ContentHandle::Path(source) => {
                    tokio::fs::copy(source, &target).await.with_context(|| {
                        format!("Failed to copy {} to {}", source.display(), target.display())
                    })?;
                }
                ContentHandle::Bytes(bytes) => {
                    tokio::fs::write(&target, bytes.as_ref())
                        .await
                        .with_context(|| format!("Failed to write {}", target.display()))?;
                }
            }

            done += descriptor.size_bytes;
            progress.report_fraction(done, total);
        }
        Ok(())
    }
}
