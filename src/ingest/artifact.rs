//! OS-generated artifact filtering

use crate::domain::FileDescriptor;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;

/// Marker files written by desktop shells, thumbnail caches and sync clients.
const DEFAULT_ARTIFACT_NAMES: &[&str] = &[
    ".DS_Store",
    "._.DS_Store",
    ".localized",
    "Thumbs.db",
    "ehthumbs.db",
    "ehthumbs_vista.db",
    "desktop.ini",
    "Desktop.ini",
    "Icon\r",
    ".dropbox",
    ".dropbox.attr",
    ".dropbox.cache",
];

/// Decides which leaf names are OS artifacts to discard silently.
///
/// Exact names are compared case-sensitively. Glob patterns are matched
/// against the leaf name only, never the full relative path.
#[derive(Debug, Clone)]
pub struct ArtifactPolicy {
    names: BTreeSet<String>,
    patterns: Vec<String>,
    globs: Option<GlobSet>,
}

impl Default for ArtifactPolicy {
    fn default() -> Self {
        Self::empty().with_names(DEFAULT_ARTIFACT_NAMES.iter().copied())
    }
}

impl ArtifactPolicy {
    /// A policy that treats nothing as an artifact.
    pub fn empty() -> Self {
        Self { names: BTreeSet::new(), patterns: Vec::new(), globs: None }
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add leaf-name glob patterns. Invalid patterns are skipped with a warning.
    pub fn with_globs(mut self, patterns: &[String]) -> Self {
        if patterns.is_empty() {
            return self;
        }
        self.patterns.extend(patterns.iter().cloned());

        let mut builder = GlobSetBuilder::new();
        for pattern in &self.patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => tracing::warn!("Ignoring invalid artifact glob '{}': {}", pattern, err),
            }
        }
        self.globs = match builder.build() {
            Ok(set) if !set.is_empty() => Some(set),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("Failed to build artifact glob set: {}", err);
                None
            }
        };
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn is_artifact_name(&self, leaf: &str) -> bool {
        self.names.contains(leaf) || self.globs.as_ref().is_some_and(|set| set.is_match(leaf))
    }

    pub fn is_artifact(&self, descriptor: &FileDescriptor) -> bool {
        self.is_artifact_name(descriptor.leaf_name())
    }

    /// Drop every artifact, preserving the order of what remains.
    pub fn filter_artifacts(&self, descriptors: Vec<FileDescriptor>) -> Vec<FileDescriptor> {
        let before = descriptors.len();
        let kept: Vec<FileDescriptor> =
            descriptors.into_iter().filter(|d| !self.is_artifact(d)).collect();
        if kept.len() != before {
            tracing::debug!("Discarded {} OS artifact(s)", before - kept.len());
        }
        kept
    }
}
