//! The user's curated selection and batch merging

use crate::domain::FileDescriptor;
use indexmap::IndexMap;

/// Ordered, identity-keyed set of descriptors. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    entries: IndexMap<String, FileDescriptor>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&FileDescriptor> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert unless the identity key is taken. Returns whether it was added.
    pub fn insert(&mut self, descriptor: FileDescriptor) -> bool {
        let key = descriptor.identity_key().to_string();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, descriptor);
        true
    }

    /// Remove one entry, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<FileDescriptor> {
        self.entries.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|d| d.size_bytes).sum()
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a FileDescriptor;
    type IntoIter = indexmap::map::Values<'a, String, FileDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl FromIterator<FileDescriptor> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = FileDescriptor>>(iter: T) -> Self {
        merge(SelectionSet::new(), iter).selection
    }
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub selection: SelectionSet,
    pub added: usize,
    /// Incoming descriptors discarded because their key was already present.
    pub duplicates: usize,
}

/// Append every incoming descriptor whose identity key is new. Existing entries
/// are never replaced; within the batch the first occurrence wins.
pub fn merge<I>(existing: SelectionSet, incoming: I) -> MergeOutcome
where
    I: IntoIterator<Item = FileDescriptor>,
{
    let mut outcome = MergeOutcome { selection: existing, ..MergeOutcome::default() };
    for descriptor in incoming {
        if outcome.selection.insert(descriptor) {
            outcome.added += 1;
        } else {
            outcome.duplicates += 1;
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContentHandle;

    fn named(name: &str, body: &str) -> FileDescriptor {
        FileDescriptor::standalone(name, body.len() as u64, ContentHandle::bytes(body))
    }

    #[test]
    fn merge_keeps_existing_instance() {
        let original = named("x.txt", "old");
        let original_content = original.content.clone();
        let existing: SelectionSet = vec![original].into_iter().collect();

        let outcome = merge(existing, vec![named("x.txt", "new!"), named("y.txt", "y")]);
        let keys: Vec<&str> = outcome.selection.keys().collect();
        assert_eq!(keys, vec!["x.txt", "y.txt"]);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.duplicates, 1);

        let kept = outcome.selection.get("x.txt").unwrap();
        assert!(kept.content.same_as(&original_content));
        assert_eq!(kept.size_bytes, 3);
    }

    #[test]
    fn merge_collapses_duplicates_within_batch() {
        let outcome = merge(SelectionSet::new(), vec![named("a", "1"), named("a", "22")]);
        assert_eq!(outcome.selection.len(), 1);
        assert_eq!(outcome.selection.get("a").unwrap().size_bytes, 1);
    }

    #[test]
    fn path_and_name_keys_are_distinct() {
        let nested = named("a.txt", "n").with_relative_path("proj/a.txt");
        let outcome = merge(SelectionSet::new(), vec![nested, named("a.txt", "f")]);
        assert_eq!(outcome.selection.len(), 2);
    }

    #[test]
    fn remove_preserves_order() {
        let mut set: SelectionSet =
            vec![named("a", ""), named("b", ""), named("c", "")].into_iter().collect();
        assert!(set.remove("b").is_some());
        assert!(set.remove("missing").is_none());
        let keys: Vec<&str> = set.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn remerge_is_idempotent() {
        let batch = || vec![named("a", "1"), named("b", "2")];
        let first = merge(SelectionSet::new(), batch()).selection;
        let second = merge(first.clone(), batch());
        assert_eq!(second.added, 0);
        assert_eq!(second.selection.keys().collect::<Vec<_>>(), first.keys().collect::<Vec<_>>());
    }
}
