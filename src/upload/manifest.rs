//! Record the selection as a manifest file instead of transferring bytes

use super::Uploader;
use crate::domain::UploadMode;
use crate::ingest::selection::SelectionSet;
use crate::render::manifest::{render_manifest, ManifestFormat};
use crate::session::ProgressReporter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

pub struct ManifestUploader {
    path: PathBuf,
    mode: UploadMode,
    format: ManifestFormat,
    include_timestamp: bool,
}

impl ManifestUploader {
    pub fn new(path: impl Into<PathBuf>, mode: UploadMode) -> Self {
        Self { path: path.into(), mode, format: ManifestFormat::Json, include_timestamp: true }
    }

    pub fn format(mut self, format: ManifestFormat) -> Self {
        self.format = format;
        self
    }

    pub fn include_timestamp(mut self, include: bool) -> Self {
        self.include_timestamp = include;
        self
    }
}

#[async_trait]
impl Uploader for ManifestUploader {
    async fn upload(&self, files: &SelectionSet, progress: ProgressReporter) -> Result<()> {
        let rendered = render_manifest(files, self.mode, self.format, self.include_timestamp)?;
        progress.report_percent(50);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, rendered)
            .await
            .with_context(|| format!("Failed to write manifest {}", self.path.display()))?;
        Ok(())
    }
}
