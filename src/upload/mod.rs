//! Upload collaborators
//!
//! The session only cares whether an upload resolved or rejected. Error
//! detail is logged, never interpreted.

use crate::ingest::selection::SelectionSet;
use crate::session::ProgressReporter;
use async_trait::async_trait;

pub mod directory;
pub mod manifest;

pub use directory::DirectoryUploader;
pub use manifest::ManifestUploader;

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, files: &SelectionSet, progress: ProgressReporter) -> anyhow::Result<()>;
}
