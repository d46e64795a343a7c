//! Drop and picker ingestion: traversal, reconciliation, filtering and merging
//!
//! Raw platform input (entry handles with paginated listings plus a flat
//! fallback file list) is reduced to a deduplicated list of
//! [`FileDescriptor`](crate::domain::FileDescriptor)s.

pub mod artifact;
pub mod entry;
pub mod fs;
pub mod memory;
pub mod picker;
pub mod reconcile;
pub mod selection;
pub mod traversal;

pub use artifact::ArtifactPolicy;
pub use entry::{DirectoryReader, Entry, EntryKind, EntryRef, ResolvedContent, TraversalError};
pub use picker::PickedFile;
pub use reconcile::{reconcile, DropItem, DropPayload, EntryCapability, FlatFile, ItemResolution};
pub use selection::{merge, MergeOutcome, SelectionSet};
pub use traversal::{traverse, traverse_with, Traversal, TraversalOptions, TraversalReport};
