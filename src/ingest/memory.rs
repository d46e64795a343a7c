//! In-memory entry trees
//!
//! Used by tests and by the `replay` command, which rebuilds a recorded drop
//! payload from JSON. Nodes can be marked as failing to exercise the contained
//! error paths of traversal.

use crate::domain::ContentHandle;
use crate::ingest::entry::{
    DirectoryReader, Entry, EntryKind, EntryRef, ResolvedContent, TraversalError,
};
use crate::ingest::reconcile::{DropItem, DropPayload, FlatFile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemoryNode {
    File {
        name: String,
        #[serde(default)]
        content: String,
        /// Resolution of this file fails.
        #[serde(default)]
        fail: bool,
    },
    Directory {
        name: String,
        #[serde(default)]
        children: Vec<Arc<MemoryNode>>,
        /// The listing fails after serving its first page.
        #[serde(default)]
        fail: bool,
    },
}

impl MemoryNode {
    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        MemoryNode::File { name: name.into(), content: content.into(), fail: false }
    }

    pub fn dir(name: impl Into<String>, children: Vec<MemoryNode>) -> Self {
        MemoryNode::Directory {
            name: name.into(),
            children: children.into_iter().map(Arc::new).collect(),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        match &mut self {
            MemoryNode::File { fail, .. } | MemoryNode::Directory { fail, .. } => *fail = true,
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            MemoryNode::File { name, .. } | MemoryNode::Directory { name, .. } => name,
        }
    }
}

/// Entry handle over a [`MemoryNode`], serving listings `page_size` at a time.
pub struct MemoryEntry {
    node: Arc<MemoryNode>,
    page_size: usize,
}

impl MemoryEntry {
    pub fn new(node: Arc<MemoryNode>, page_size: usize) -> Self {
        Self { node, page_size: page_size.max(1) }
    }

    pub fn root(node: MemoryNode, page_size: usize) -> EntryRef {
        Arc::new(Self::new(Arc::new(node), page_size))
    }
}

#[async_trait]
impl Entry for MemoryEntry {
    fn name(&self) -> &str {
        self.node.name()
    }

    fn kind(&self) -> EntryKind {
        match self.node.as_ref() {
            MemoryNode::File { .. } => EntryKind::File,
            MemoryNode::Directory { .. } => EntryKind::Directory,
        }
    }

    async fn resolve(&self) -> Result<ResolvedContent, TraversalError> {
        tokio::task::yield_now().await;
        match self.node.as_ref() {
            MemoryNode::File { name, fail: true, .. } => Err(TraversalError::Resolve {
                path: name.clone(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"),
            }),
            MemoryNode::File { content, .. } => Ok(ResolvedContent {
                size_bytes: content.len() as u64,
                content: ContentHandle::bytes(content.as_bytes()),
            }),
            MemoryNode::Directory { name, .. } => {
                Err(TraversalError::NotAFile { path: name.clone() })
            }
        }
    }

    async fn open_reader(&self) -> Result<Box<dyn DirectoryReader>, TraversalError> {
        match self.node.as_ref() {
            MemoryNode::Directory { name, children, fail } => Ok(Box::new(MemoryReader {
                name: name.clone(),
                children: children.clone(),
                cursor: 0,
                page_size: self.page_size,
                fail: *fail,
            })),
            MemoryNode::File { name, .. } => {
                Err(TraversalError::NotADirectory { path: name.clone() })
            }
        }
    }
}

struct MemoryReader {
    name: String,
    children: Vec<Arc<MemoryNode>>,
    cursor: usize,
    page_size: usize,
    fail: bool,
}

#[async_trait]
impl DirectoryReader for MemoryReader {
    async fn next_page(&mut self) -> Result<Vec<EntryRef>, TraversalError> {
        tokio::task::yield_now().await;
        if self.fail && (self.cursor > 0 || self.children.is_empty()) {
            return Err(TraversalError::Listing {
                path: self.name.clone(),
                source: io::Error::new(io::ErrorKind::Other, "injected listing failure"),
            });
        }
        let end = (self.cursor + self.page_size).min(self.children.len());
        let page = self.children[self.cursor..end]
            .iter()
            .map(|node| Arc::new(MemoryEntry::new(Arc::clone(node), self.page_size)) as EntryRef)
            .collect();
        self.cursor = end;
        Ok(page)
    }
}

/// A drop payload recorded as JSON.
///
/// ```json
/// { "page_size": 2,
///   "items": [ { "kind": "entry", "entry": { "type": "directory", "name": "proj", "children": [] } },
///              { "kind": "missing" } ],
///   "files": [ { "name": "proj", "content": "" }, { "name": "photo.heic", "content": "..." } ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedDrop {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub items: Vec<RecordedItem>,
    #[serde(default)]
    pub files: Vec<RecordedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedItem {
    Entry { entry: MemoryNode },
    Missing,
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFile {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

fn default_page_size() -> usize {
    100
}

impl RecordedDrop {
    pub fn into_payload(self) -> DropPayload {
        let page_size = self.page_size;
        let items = self
            .items
            .into_iter()
            .map(|item| match item {
                RecordedItem::Entry { entry } => DropItem::entry(MemoryEntry::root(entry, page_size)),
                RecordedItem::Missing => DropItem::missing(),
                RecordedItem::Unsupported => DropItem::unsupported(),
            })
            .collect();
        let files = self
            .files
            .into_iter()
            .map(|f| {
                FlatFile::new(f.name, f.content.len() as u64, ContentHandle::bytes(f.content))
            })
            .collect();
        DropPayload { items, files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reader_pages_then_empties() {
        let entry = MemoryEntry::root(
            MemoryNode::dir("d", vec![MemoryNode::file("a", ""), MemoryNode::file("b", "")]),
            1,
        );
        let mut reader = entry.open_reader().await.unwrap();
        assert_eq!(reader.next_page().await.unwrap().len(), 1);
        assert_eq!(reader.next_page().await.unwrap().len(), 1);
        assert!(reader.next_page().await.unwrap().is_empty());
        assert!(reader.next_page().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_listing_serves_first_page_only() {
        let entry = MemoryEntry::root(
            MemoryNode::dir("d", vec![MemoryNode::file("a", ""), MemoryNode::file("b", "")])
                .failing(),
            1,
        );
        let mut reader = entry.open_reader().await.unwrap();
        assert_eq!(reader.next_page().await.unwrap().len(), 1);
        assert!(reader.next_page().await.is_err());
    }

    #[test]
    fn recorded_drop_parses() {
        let json = r#"{
            "page_size": 2,
            "items": [
                {"kind": "entry", "entry": {"type": "directory", "name": "proj", "children": [
                    {"type": "file", "name": "a.txt", "content": "hi"}
                ]}},
                {"kind": "missing"}
            ],
            "files": [{"name": "proj"}, {"name": "photo.heic", "content": "raw"}]
        }"#;
        let recorded: RecordedDrop = serde_json::from_str(json).unwrap();
        let payload = recorded.into_payload();
        assert_eq!(payload.items.len(), 2);
        assert!(payload.items[0].entry_handle().is_some());
        assert!(payload.items[1].entry_handle().is_none());
        assert_eq!(payload.files[1].size_bytes, 3);
    }
}
