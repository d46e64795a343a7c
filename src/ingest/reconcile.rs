//! Reconciliation of structured drop entries with the flat fallback file list
//!
//! A drop delivers two views of the same items: entry handles that can be
//! walked, and a flat list of plain files indexed like the items. Platforms
//! sometimes withhold the entry for an item while still listing its file, so
//! every index that could not be resolved structurally falls back to its flat
//! file, and every index that was resolved never does.

use crate::domain::{ContentHandle, FileDescriptor};
use crate::ingest::entry::EntryRef;
use crate::ingest::traversal::{traverse_with, Traversal, TraversalOptions, TraversalReport};
use futures::future::join_all;

/// What a dropped item offers in terms of structured access.
#[derive(Clone)]
pub enum EntryCapability {
    /// The platform exposes no structured access for this item at all.
    Unsupported,
    /// Structured access exists but produced no entry for this item.
    Missing,
    Available(EntryRef),
}

#[derive(Clone)]
pub struct DropItem {
    capability: EntryCapability,
}

impl DropItem {
    pub fn entry(entry: EntryRef) -> Self {
        Self { capability: EntryCapability::Available(entry) }
    }

    pub fn missing() -> Self {
        Self { capability: EntryCapability::Missing }
    }

    pub fn unsupported() -> Self {
        Self { capability: EntryCapability::Unsupported }
    }

    pub fn capability(&self) -> &EntryCapability {
        &self.capability
    }

    pub fn supports_entries(&self) -> bool {
        !matches!(self.capability, EntryCapability::Unsupported)
    }

    pub fn entry_handle(&self) -> Option<EntryRef> {
        match &self.capability {
            EntryCapability::Available(entry) => Some(EntryRef::clone(entry)),
            _ => None,
        }
    }
}

/// A plain file from the flat list, without folder context.
#[derive(Debug, Clone)]
pub struct FlatFile {
    pub name: String,
    pub size_bytes: u64,
    pub content: ContentHandle,
}

impl FlatFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, content: ContentHandle) -> Self {
        Self { name: name.into(), size_bytes, content }
    }

    pub fn to_descriptor(&self) -> FileDescriptor {
        FileDescriptor::standalone(self.name.clone(), self.size_bytes, self.content.clone())
    }
}

/// Raw drop event input.
#[derive(Clone, Default)]
pub struct DropPayload {
    pub items: Vec<DropItem>,
    pub files: Vec<FlatFile>,
}

/// Outcome for one item index.
#[derive(Debug)]
pub enum ItemResolution {
    Resolved(Traversal),
    Unresolved,
}

impl ItemResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ItemResolution::Resolved(_))
    }
}

#[derive(Debug, Default)]
pub struct Reconciled {
    pub descriptors: Vec<FileDescriptor>,
    /// Flat files used because their item had no entry.
    pub fallbacks: usize,
    /// No item exposed structured access; only the flat list was used.
    pub degraded: bool,
    pub report: TraversalReport,
}

/// Traverse every item that yields an entry; items run concurrently and the
/// results come back in index order.
pub async fn resolve_items(items: &[DropItem], options: &TraversalOptions) -> Vec<ItemResolution> {
    join_all(items.iter().map(|item| async move {
        match item.entry_handle() {
            Some(entry) => ItemResolution::Resolved(traverse_with(entry, "", options).await),
            None => ItemResolution::Unresolved,
        }
    }))
    .await
}

pub async fn reconcile(
    items: &[DropItem],
    files: &[FlatFile],
    options: &TraversalOptions,
) -> Reconciled {
    if !items.iter().any(DropItem::supports_entries) {
        tracing::debug!("No structured entries in drop; using {} flat file(s)", files.len());
        return Reconciled {
            descriptors: files.iter().map(FlatFile::to_descriptor).collect(),
            fallbacks: files.len(),
            degraded: true,
            report: TraversalReport::default(),
        };
    }

    let resolutions = resolve_items(items, options).await;

    let mut reconciled = Reconciled::default();
    let mut resolved = vec![false; resolutions.len()];
    for (index, resolution) in resolutions.into_iter().enumerate() {
        if let ItemResolution::Resolved(traversal) = resolution {
            resolved[index] = true;
            reconciled.report.absorb(&traversal.report);
            reconciled.descriptors.extend(traversal.descriptors);
        }
    }

    for (index, file) in files.iter().enumerate() {
        if !resolved.get(index).copied().unwrap_or(false) {
            reconciled.descriptors.push(file.to_descriptor());
            reconciled.fallbacks += 1;
        }
    }

    if reconciled.fallbacks > 0 {
        tracing::debug!("Fell back to {} flat file(s) for unresolved items", reconciled.fallbacks);
    }
    reconciled
}

impl DropPayload {
    pub async fn reconcile(&self, options: &TraversalOptions) -> Reconciled {
        reconcile(&self.items, &self.files, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::memory::{MemoryEntry, MemoryNode};

    fn flat(name: &str) -> FlatFile {
        FlatFile::new(name, 1, ContentHandle::bytes("f"))
    }

    fn keys(r: &Reconciled) -> Vec<&str> {
        r.descriptors.iter().map(|d| d.identity_key()).collect()
    }

    #[tokio::test]
    async fn degraded_path_uses_flat_files_only() {
        let items = vec![DropItem::unsupported(), DropItem::unsupported()];
        let files = vec![flat("a.txt"), flat("b.txt")];
        let r = reconcile(&items, &files, &TraversalOptions::default()).await;
        assert!(r.degraded);
        assert_eq!(keys(&r), vec!["a.txt", "b.txt"]);
        assert!(r.descriptors.iter().all(|d| d.relative_path.is_none()));
    }

    #[tokio::test]
    async fn unresolved_index_falls_back_resolved_does_not() {
        let items = vec![
            DropItem::entry(MemoryEntry::root(
                MemoryNode::dir("proj", vec![MemoryNode::file("a.txt", "a")]),
                4,
            )),
            DropItem::missing(),
        ];
        // index 0 is the folder's own placeholder file, index 1 the real file
        let files = vec![flat("proj"), flat("photo.heic")];

        let r = reconcile(&items, &files, &TraversalOptions::default()).await;
        assert!(!r.degraded);
        assert_eq!(r.fallbacks, 1);
        assert_eq!(keys(&r), vec!["proj/a.txt", "photo.heic"]);
        assert!(r.descriptors[1].relative_path.is_none());
    }

    #[tokio::test]
    async fn structured_results_precede_fallbacks() {
        let items = vec![
            DropItem::missing(),
            DropItem::entry(MemoryEntry::root(MemoryNode::file("z.txt", "z"), 4)),
            DropItem::missing(),
        ];
        let files = vec![flat("first"), flat("z.txt"), flat("third")];
        let r = reconcile(&items, &files, &TraversalOptions::default()).await;
        assert_eq!(keys(&r), vec!["z.txt", "first", "third"]);
    }

    #[tokio::test]
    async fn flat_files_beyond_items_fall_back() {
        let items = vec![DropItem::entry(MemoryEntry::root(MemoryNode::file("a", "a"), 4))];
        let files = vec![flat("a"), flat("extra")];
        let r = reconcile(&items, &files, &TraversalOptions::default()).await;
        assert_eq!(keys(&r), vec!["a", "extra"]);
    }

    #[tokio::test]
    async fn resolved_but_empty_does_not_fall_back() {
        let items = vec![DropItem::entry(MemoryEntry::root(MemoryNode::dir("empty", vec![]), 4))];
        let files = vec![flat("empty")];
        let r = reconcile(&items, &files, &TraversalOptions::default()).await;
        assert!(r.descriptors.is_empty());
        assert_eq!(r.fallbacks, 0);
    }

    #[tokio::test]
    async fn resolutions_are_tagged_per_index() {
        let items = vec![
            DropItem::missing(),
            DropItem::entry(MemoryEntry::root(MemoryNode::file("a", "a"), 4)),
            DropItem::unsupported(),
        ];
        let resolutions = resolve_items(&items, &TraversalOptions::default()).await;
        let tags: Vec<bool> = resolutions.iter().map(ItemResolution::is_resolved).collect();
        assert_eq!(tags, vec![false, true, false]);
    }
}
