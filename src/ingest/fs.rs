//! Filesystem-backed entries
//!
//! Directory listings are served in fixed-size pages from `tokio::fs::ReadDir`,
//! so local drops go through the same drain-until-empty loop as platform ones.

use crate::domain::ContentHandle;
use crate::ingest::entry::{
    DirectoryReader, Entry, EntryKind, EntryRef, ResolvedContent, TraversalError,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct FsOptions {
    pub page_size: usize,
    pub follow_symlinks: bool,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self { page_size: 64, follow_symlinks: false }
    }
}

pub struct FsEntry {
    path: PathBuf,
    name: String,
    kind: EntryKind,
    options: FsOptions,
    /// Canonical paths of this directory and its ancestors. Only tracked when
    /// following symlinks, the one case where a walk can loop.
    ancestors: Arc<[PathBuf]>,
}

impl FsEntry {
    /// Entry for an existing file or directory.
    pub async fn open(path: &Path, options: FsOptions) -> Result<EntryRef, TraversalError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|source| {
            TraversalError::Resolve { path: path.display().to_string(), source }
        })?;
        let kind = if metadata.is_dir() { EntryKind::Directory } else { EntryKind::File };

        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => tokio::fs::canonicalize(path)
                .await
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
                .unwrap_or_else(|| "root".to_string()),
        };

        let ancestors: Arc<[PathBuf]> = match kind {
            EntryKind::Directory if options.follow_symlinks => {
                let canonical = tokio::fs::canonicalize(path).await.map_err(|source| {
                    TraversalError::Resolve { path: path.display().to_string(), source }
                })?;
                Arc::from(vec![canonical])
            }
            _ => Arc::from(Vec::new()),
        };

        Ok(Arc::new(FsEntry { path: path.to_path_buf(), name, kind, options, ancestors }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Entry for FsEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }

    async fn resolve(&self) -> Result<ResolvedContent, TraversalError> {
        if self.kind == EntryKind::Directory {
            return Err(TraversalError::NotAFile { path: self.path.display().to_string() });
        }
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|source| {
            TraversalError::Resolve { path: self.path.display().to_string(), source }
        })?;
        Ok(ResolvedContent {
            size_bytes: metadata.len(),
            content: ContentHandle::Path(self.path.clone()),
        })
    }

    async fn open_reader(&self) -> Result<Box<dyn DirectoryReader>, TraversalError> {
        if self.kind != EntryKind::Directory {
            return Err(TraversalError::NotADirectory { path: self.path.display().to_string() });
        }
        let dir = tokio::fs::read_dir(&self.path).await.map_err(|source| {
            TraversalError::Listing { path: self.path.display().to_string(), source }
        })?;
        Ok(Box::new(FsReader {
            path: self.path.clone(),
            dir,
            options: self.options,
            ancestors: Arc::clone(&self.ancestors),
        }))
    }
}

struct FsReader {
    path: PathBuf,
    dir: tokio::fs::ReadDir,
    options: FsOptions,
    ancestors: Arc<[PathBuf]>,
}

impl FsReader {
    fn listing_error(&self, source: std::io::Error) -> TraversalError {
        TraversalError::Listing { path: self.path.display().to_string(), source }
    }

    /// Ancestor chain for a child directory, or `None` when the child leads
    /// back to a directory already being walked.
    async fn child_ancestors(&self, child: &Path) -> Option<Arc<[PathBuf]>> {
        if !self.options.follow_symlinks {
            return Some(Arc::from(Vec::new()));
        }
        let canonical = match tokio::fs::canonicalize(child).await {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!("Skipping unresolvable directory {}: {}", child.display(), err);
                return None;
            }
        };
        if self.ancestors.contains(&canonical) {
            tracing::warn!(
                "Skipping filesystem loop: {} points to ancestor {}",
                child.display(),
                canonical.display()
            );
            return None;
        }
        let mut chain = self.ancestors.to_vec();
        chain.push(canonical);
        Some(Arc::from(chain))
    }
}

#[async_trait]
impl DirectoryReader for FsReader {
    async fn next_page(&mut self) -> Result<Vec<EntryRef>, TraversalError> {
        let mut page: Vec<EntryRef> = Vec::new();
        while page.len() < self.options.page_size {
            let Some(child) = self.dir.next_entry().await.map_err(|e| self.listing_error(e))?
            else {
                break;
            };
            let path = child.path();
            let file_type = child.file_type().await.map_err(|e| self.listing_error(e))?;

            let kind = if file_type.is_symlink() {
                if !self.options.follow_symlinks {
                    tracing::debug!("Skipping symlink {}", path.display());
                    continue;
                }
                match tokio::fs::metadata(&path).await {
                    Ok(m) if m.is_dir() => EntryKind::Directory,
                    Ok(m) if m.is_file() => EntryKind::File,
                    Ok(_) => continue,
                    Err(err) => {
                        tracing::warn!("Skipping dangling symlink {}: {}", path.display(), err);
                        continue;
                    }
                }
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };

            let ancestors = match kind {
                EntryKind::Directory => match self.child_ancestors(&path).await {
                    Some(chain) => chain,
                    None => continue,
                },
                EntryKind::File => Arc::from(Vec::new()),
            };

            page.push(Arc::new(FsEntry {
                name: child.file_name().to_string_lossy().to_string(),
                path,
                kind,
                options: self.options,
                ancestors,
            }));
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::traversal::{traverse_with, TraversalOptions};
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn walks_real_directory_in_small_pages() {
        let tmp = TempDir::new().expect("tmp");
        let root = tmp.path().join("proj");
        fs::create_dir_all(root.join("sub")).expect("mkdir");
        fs::write(root.join("a.txt"), "aaa").expect("write");
        fs::write(root.join("b.txt"), "b").expect("write");
        fs::write(root.join("sub/c.txt"), "cc").expect("write");

        let entry = FsEntry::open(&root, FsOptions { page_size: 1, follow_symlinks: false })
            .await
            .expect("open");
        let traversal = traverse_with(entry, "", &TraversalOptions::default()).await;

        let mut keys: Vec<&str> =
            traversal.descriptors.iter().map(|d| d.identity_key()).collect();
        keys.sort();
        assert_eq!(keys, vec!["proj/a.txt", "proj/b.txt", "proj/sub/c.txt"]);
        // proj: 3 pages + empty, sub: 1 page + empty
        assert_eq!(traversal.report.pages_read, 6);
        let a = traversal.descriptors.iter().find(|d| d.name == "a.txt").unwrap();
        assert_eq!(a.size_bytes, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_back_to_ancestor_is_not_walked() {
        let tmp = TempDir::new().expect("tmp");
        let root = tmp.path().join("proj");
        fs::create_dir_all(root.join("sub")).expect("mkdir");
        fs::write(root.join("a.txt"), "a").expect("write");
        fs::write(root.join("sub/b.txt"), "b").expect("write");
        std::os::unix::fs::symlink(&root, root.join("loop")).expect("symlink");
        std::os::unix::fs::symlink(&root, root.join("sub/up")).expect("symlink");

        let entry = FsEntry::open(&root, FsOptions { page_size: 8, follow_symlinks: true })
            .await
            .expect("open");
        let traversal = traverse_with(entry, "", &TraversalOptions::default()).await;

        let mut keys: Vec<&str> =
            traversal.descriptors.iter().map(|d| d.identity_key()).collect();
        keys.sort();
        assert_eq!(keys, vec!["proj/a.txt", "proj/sub/b.txt"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_sibling_directory_is_followed() {
        let tmp = TempDir::new().expect("tmp");
        let shared = tmp.path().join("shared");
        let root = tmp.path().join("proj");
        fs::create_dir_all(&shared).expect("mkdir");
        fs::create_dir_all(&root).expect("mkdir");
        fs::write(shared.join("c.txt"), "c").expect("write");
        std::os::unix::fs::symlink(&shared, root.join("link")).expect("symlink");

        let follow = FsEntry::open(&root, FsOptions { page_size: 8, follow_symlinks: true })
            .await
            .expect("open");
        let followed = traverse_with(follow, "", &TraversalOptions::default()).await;
        assert_eq!(followed.descriptors.len(), 1);
        assert_eq!(followed.descriptors[0].identity_key(), "proj/link/c.txt");

        let skip = FsEntry::open(&root, FsOptions::default()).await.expect("open");
        assert!(traverse_with(skip, "", &TraversalOptions::default()).await.descriptors.is_empty());
    }

    #[tokio::test]
    async fn open_missing_path_fails() {
        let tmp = TempDir::new().expect("tmp");
        assert!(FsEntry::open(&tmp.path().join("nope"), FsOptions::default()).await.is_err());
    }
}
