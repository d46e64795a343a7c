//! Core domain types shared across the crate.

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::ingest::artifact::ArtifactPolicy;
use crate::ingest::fs::FsOptions;
use crate::ingest::traversal::TraversalOptions;
use crate::session::Settings;

/// Schema version stamped into rendered manifests.
pub const MANIFEST_SCHEMA_VERSION: &str = "1.0.0";

/// Opaque handle to a file's bytes. The ingestion core never reads through it;
/// upload collaborators do.
#[derive(Clone)]
pub enum ContentHandle {
    /// File living on the local filesystem.
    Path(PathBuf),
    /// Bytes already held in memory (recorded drops, tests).
    Bytes(Arc<[u8]>),
}

impl ContentHandle {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        ContentHandle::Bytes(Arc::from(data.into()))
    }

    /// True when both handles point at the same underlying content.
    pub fn same_as(&self, other: &ContentHandle) -> bool {
        match (self, other) {
            (ContentHandle::Path(a), ContentHandle::Path(b)) => a == b,
            (ContentHandle::Bytes(a), ContentHandle::Bytes(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentHandle::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ContentHandle::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// A single file the user intends to upload.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub name: String,
    /// Slash-separated path from the dropped/selected folder root, inclusive of
    /// the file name. `None` when the file arrived without folder context.
    pub relative_path: Option<String>,
    pub size_bytes: u64,
    pub content: ContentHandle,
}

impl FileDescriptor {
    /// Descriptor for a file selected without folder context.
    pub fn standalone(name: impl Into<String>, size_bytes: u64, content: ContentHandle) -> Self {
        Self { name: name.into(), relative_path: None, size_bytes, content }
    }

    pub fn with_relative_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = Some(relative_path.into());
        self
    }

    /// Deduplication key: the relative path when present, else the name.
    pub fn identity_key(&self) -> &str {
        self.relative_path.as_deref().unwrap_or(&self.name)
    }

    /// Last path segment of the relative path, or the name.
    pub fn leaf_name(&self) -> &str {
        match self.relative_path.as_deref() {
            Some(path) => path.rsplit('/').next().unwrap_or(path),
            None => &self.name,
        }
    }

    /// True when the descriptor carries folder structure.
    pub fn is_nested(&self) -> bool {
        self.relative_path.as_deref().is_some_and(|p| p.contains('/'))
    }
}

/// Which native picker is offered and which validation policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Single files only; folder-shaped batches are rejected.
    File,
    #[default]
    Folder,
}

impl UploadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMode::File => "file",
            UploadMode::Folder => "folder",
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "files" => Ok(UploadMode::File),
            "folder" | "folders" | "directory" | "dir" => Ok(UploadMode::Folder),
            other => anyhow::bail!("Invalid upload mode '{}': expected 'file' or 'folder'", other),
        }
    }
}

/// On-disk configuration (`drop-ingest.toml` / `.drop-ingest.yml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: UploadMode,
    /// Extra exact artifact names, added to the built-in set.
    #[serde(deserialize_with = "string_or_list")]
    pub artifact_names: Vec<String>,
    /// Leaf-name glob patterns treated as artifacts.
    #[serde(deserialize_with = "string_or_list")]
    pub artifact_globs: Vec<String>,
    /// Drop the built-in artifact names and use only the configured ones.
    pub replace_default_artifacts: bool,
    /// Entries returned per directory listing page by the filesystem backend.
    pub page_size: usize,
    pub max_in_flight: Option<usize>,
    pub completion_linger_ms: u64,
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: UploadMode::default(),
            artifact_names: Vec::new(),
            artifact_globs: Vec::new(),
            replace_default_artifacts: false,
            page_size: 64,
            max_in_flight: None,
            completion_linger_ms: 1500,
            follow_symlinks: false,
        }
    }
}

impl Config {
    pub fn artifact_policy(&self) -> ArtifactPolicy {
        let base =
            if self.replace_default_artifacts { ArtifactPolicy::empty() } else { ArtifactPolicy::default() };
        base.with_names(self.artifact_names.iter().cloned()).with_globs(&self.artifact_globs)
    }

    pub fn fs_options(&self) -> FsOptions {
        FsOptions { page_size: self.page_size.max(1), follow_symlinks: self.follow_symlinks }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            mode: self.mode,
            artifacts: self.artifact_policy(),
            traversal: TraversalOptions { max_in_flight: self.max_in_flight },
            completion_linger: Duration::from_millis(self.completion_linger_ms),
        }
    }
}

/// Accept either `"a, b"` or `["a", "b"]`, trimming and dropping empty parts.
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let parts = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        StringOrList::Many(list) => list,
    };
    Ok(parts.into_iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, path: Option<&str>) -> FileDescriptor {
        let d = FileDescriptor::standalone(name, 1, ContentHandle::bytes("x"));
        match path {
            Some(p) => d.with_relative_path(p),
            None => d,
        }
    }

    #[test]
    fn identity_key_prefers_relative_path() {
        assert_eq!(descriptor("b.txt", Some("proj/sub/b.txt")).identity_key(), "proj/sub/b.txt");
        assert_eq!(descriptor("b.txt", None).identity_key(), "b.txt");
    }

    #[test]
    fn leaf_name_uses_last_segment() {
        assert_eq!(descriptor("ignored", Some("proj/sub/.DS_Store")).leaf_name(), ".DS_Store");
        assert_eq!(descriptor("Thumbs.db", None).leaf_name(), "Thumbs.db");
    }

    #[test]
    fn nested_only_when_path_has_separator() {
        assert!(descriptor("a.txt", Some("proj/a.txt")).is_nested());
        assert!(!descriptor("a.txt", Some("a.txt")).is_nested());
        assert!(!descriptor("a.txt", None).is_nested());
    }

    #[test]
    fn upload_mode_parses_aliases() {
        assert_eq!("files".parse::<UploadMode>().unwrap(), UploadMode::File);
        assert_eq!(" Directory ".parse::<UploadMode>().unwrap(), UploadMode::Folder);
        assert!("both".parse::<UploadMode>().is_err());
    }

    #[test]
    fn content_handle_identity() {
        let a = ContentHandle::bytes("same");
        let b = ContentHandle::bytes("same");
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }
}
