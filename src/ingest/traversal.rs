//! Entry traversal
//!
//! Walks an entry tree with an explicit work list instead of recursion, so
//! arbitrarily deep trees never grow the call stack. Every discovered node gets
//! a slot in an arena; tasks for sibling subtrees run concurrently and fill
//! their slots in whatever order they complete. The final flatten walks the
//! arena depth-first, which restores discovery order within every subtree.

use crate::domain::FileDescriptor;
use crate::ingest::entry::{EntryKind, EntryRef, TraversalError};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalOptions {
    /// Upper bound on tasks polled at once. `None` means unbounded.
    pub max_in_flight: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalReport {
    pub files: usize,
    pub directories_read: usize,
    /// Listing pages requested, including each terminating empty page.
    pub pages_read: usize,
    pub leaf_failures: usize,
    pub directory_failures: usize,
}

impl TraversalReport {
    pub fn absorb(&mut self, other: &TraversalReport) {
        self.files += other.files;
        self.directories_read += other.directories_read;
        self.pages_read += other.pages_read;
        self.leaf_failures += other.leaf_failures;
        self.directory_failures += other.directory_failures;
    }
}

#[derive(Debug, Default)]
pub struct Traversal {
    pub descriptors: Vec<FileDescriptor>,
    pub report: TraversalReport,
}

/// One unit of pending work: an entry and the path of its parent.
struct TraversalTask {
    entry: EntryRef,
    path_prefix: String,
    slot: usize,
}

enum Slot {
    Pending,
    File(FileDescriptor),
    Directory(Vec<usize>),
    Dropped,
}

enum TaskOutcome {
    File(FileDescriptor),
    Directory { path: String, children: Vec<EntryRef>, pages: usize },
    LeafFailed,
    ListingFailed,
}

/// Every leaf file beneath `entry`, each stamped with its relative path.
pub async fn traverse(entry: EntryRef, path_prefix: &str) -> Vec<FileDescriptor> {
    traverse_with(entry, path_prefix, &TraversalOptions::default()).await.descriptors
}

pub async fn traverse_with(
    entry: EntryRef,
    path_prefix: &str,
    options: &TraversalOptions,
) -> Traversal {
    let limit = options.max_in_flight.unwrap_or(usize::MAX).max(1);
    let mut report = TraversalReport::default();
    let mut slots = vec![Slot::Pending];
    let mut queue = VecDeque::from([TraversalTask {
        entry,
        path_prefix: path_prefix.to_string(),
        slot: 0,
    }]);
    let mut in_flight = FuturesUnordered::new();

    loop {
        while in_flight.len() < limit {
            match queue.pop_front() {
                Some(task) => in_flight.push(run_task(task)),
                None => break,
            }
        }

        let Some((slot, outcome)) = in_flight.next().await else {
            break;
        };

        slots[slot] = match outcome {
            TaskOutcome::File(descriptor) => {
                report.files += 1;
                Slot::File(descriptor)
            }
            TaskOutcome::Directory { path, children, pages } => {
                report.directories_read += 1;
                report.pages_read += pages;
                let child_prefix = format!("{}/", path);
                let mut child_slots = Vec::with_capacity(children.len());
                for child in children {
                    let id = slots.len();
                    slots.push(Slot::Pending);
                    child_slots.push(id);
                    queue.push_back(TraversalTask {
                        entry: child,
                        path_prefix: child_prefix.clone(),
                        slot: id,
                    });
                }
                Slot::Directory(child_slots)
            }
            TaskOutcome::LeafFailed => {
                report.leaf_failures += 1;
                Slot::Dropped
            }
            TaskOutcome::ListingFailed => {
                report.directory_failures += 1;
                Slot::Dropped
            }
        };
    }

    let descriptors = flatten(slots);
    tracing::debug!(
        "Traversal finished: {} file(s), {} dir(s), {} page(s), {} failure(s)",
        report.files,
        report.directories_read,
        report.pages_read,
        report.leaf_failures + report.directory_failures
    );
    Traversal { descriptors, report }
}

async fn run_task(task: TraversalTask) -> (usize, TaskOutcome) {
    let TraversalTask { entry, path_prefix, slot } = task;
    let path = format!("{}{}", path_prefix, entry.name());

    let outcome = match entry.kind() {
        EntryKind::File => match entry.resolve().await {
            Ok(resolved) => TaskOutcome::File(
                FileDescriptor::standalone(entry.name(), resolved.size_bytes, resolved.content)
                    .with_relative_path(path),
            ),
            Err(err) => {
                tracing::warn!("Skipping unreadable file {}: {}", path, err);
                TaskOutcome::LeafFailed
            }
        },
        EntryKind::Directory => match drain_listing(&entry).await {
            Ok((children, pages)) => TaskOutcome::Directory { path, children, pages },
            Err(err) => {
                tracing::warn!("Skipping directory {}: {}", path, err);
                TaskOutcome::ListingFailed
            }
        },
    };
    (slot, outcome)
}

/// Request pages until one comes back empty. Each request waits on the
/// previous one because the reader is a stateful cursor.
async fn drain_listing(entry: &EntryRef) -> Result<(Vec<EntryRef>, usize), TraversalError> {
    let mut reader = entry.open_reader().await?;
    let mut children = Vec::new();
    let mut pages = 0;
    loop {
        let page = reader.next_page().await?;
        pages += 1;
        if page.is_empty() {
            return Ok((children, pages));
        }
        children.extend(page);
    }
}

fn flatten(mut slots: Vec<Slot>) -> Vec<FileDescriptor> {
    let mut out = Vec::new();
    let mut stack = vec![0usize];
    while let Some(id) = stack.pop() {
        match std::mem::replace(&mut slots[id], Slot::Dropped) {
            Slot::File(descriptor) => out.push(descriptor),
            Slot::Directory(children) => stack.extend(children.into_iter().rev()),
            Slot::Pending | Slot::Dropped => {}
        }
    }
    out
}
