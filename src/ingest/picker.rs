//! Native picker input
//!
//! Picker selections are already flat; folder pickers attach a relative path
//! hint rooted at the chosen folder's name.

use crate::domain::{ContentHandle, FileDescriptor};
use crate::utils::normalize_path;
use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct PickedFile {
    pub name: String,
    /// Empty or missing when the picker ran without folder context.
    pub relative_path_hint: Option<String>,
    pub size_bytes: u64,
    pub content: ContentHandle,
}

impl PickedFile {
    pub fn to_descriptor(&self) -> FileDescriptor {
        let descriptor =
            FileDescriptor::standalone(self.name.clone(), self.size_bytes, self.content.clone());
        match self.relative_path_hint.as_deref().map(str::trim) {
            Some(hint) if !hint.is_empty() => descriptor.with_relative_path(normalize_path(hint)),
            _ => descriptor,
        }
    }
}

/// Picker result for individually chosen files.
pub fn pick_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PickedFile>> {
    let mut picked = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("Not a file: {}", path.display());
        }
        picked.push(PickedFile {
            name: file_name(path),
            relative_path_hint: None,
            size_bytes: metadata.len(),
            content: ContentHandle::Path(path.to_path_buf()),
        });
    }
    Ok(picked)
}

/// Picker result for a folder chosen in folder mode: every file beneath it,
/// hinted with `<folder>/<path inside folder>`.
pub fn pick_folder(folder: &Path, follow_symlinks: bool) -> Result<Vec<PickedFile>> {
    if !folder.is_dir() {
        anyhow::bail!("Path is not a directory: {}", folder.display());
    }
    let root_name = file_name(folder);

    let mut picked = Vec::new();
    let walker =
        WalkDir::new(folder).follow_links(follow_symlinks).sort_by_file_name().into_iter();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", folder.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(folder) else {
            continue;
        };
        let size_bytes = match entry.metadata() {
            Ok(m) => m.len(),
            Err(err) => {
                tracing::warn!("Skipping {}: {}", entry.path().display(), err);
                continue;
            }
        };
        let hint = format!("{}/{}", root_name, normalize_path(&rel.to_string_lossy()));
        picked.push(PickedFile {
            name: entry.file_name().to_string_lossy().to_string(),
            relative_path_hint: Some(hint),
            size_bytes,
            content: ContentHandle::Path(entry.path().to_path_buf()),
        });
    }
    Ok(picked)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .or_else(|| {
            path.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        })
        .unwrap_or_else(|| ".".to_string())
}
