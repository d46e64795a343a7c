//! Path normalization

use std::path::{Component, Path, PathBuf};

pub fn normalize_path(path: &str) -> String {
    // Convert backslashes to forward slashes and normalize
    path.replace('\\', "/")
}

/// Turn an identity key into a relative filesystem path, refusing anything that
/// would escape the destination root.
pub fn safe_relative_path(key: &str) -> Option<PathBuf> {
    let candidate = Path::new(key);
    let mut out = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}
