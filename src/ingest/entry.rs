//! Platform entry handles
//!
//! An [`Entry`] is a file or directory node reached through a drop. Directories
//! expose their children through a stateful [`DirectoryReader`] that hands out
//! one page at a time; a single page is never assumed to be the whole listing.

use crate::domain::ContentHandle;
use async_trait::async_trait;
use std::io;
use std::sync::Arc;

pub type EntryRef = Arc<dyn Entry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Content of a leaf entry once resolved.
#[derive(Debug, Clone)]
pub struct ResolvedContent {
    pub size_bytes: u64,
    pub content: ContentHandle,
}

/// Failure contained to a single subtree during traversal.
#[derive(Debug, thiserror::Error)]
pub enum TraversalError {
    #[error("failed to list directory '{path}': {source}")]
    Listing {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to resolve file '{path}': {source}")]
    Resolve {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("'{path}' is a directory and has no file content")]
    NotAFile { path: String },

    #[error("'{path}' is not a directory")]
    NotADirectory { path: String },
}

#[async_trait]
pub trait Entry: Send + Sync {
    /// Leaf name of this node (no separators).
    fn name(&self) -> &str;

    fn kind(&self) -> EntryKind;

    /// Resolve the underlying file content. Only meaningful for file entries.
    async fn resolve(&self) -> Result<ResolvedContent, TraversalError>;

    /// Open a fresh listing cursor. Only meaningful for directory entries.
    async fn open_reader(&self) -> Result<Box<dyn DirectoryReader>, TraversalError>;
}

#[async_trait]
pub trait DirectoryReader: Send {
    /// Next page of children. An empty page means the listing is exhausted.
    async fn next_page(&mut self) -> Result<Vec<EntryRef>, TraversalError>;
}
