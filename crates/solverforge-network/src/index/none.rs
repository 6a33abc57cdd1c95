use solverforge_core::{ElementAwareLists, EntryId, ListId, Result};

use super::Indexer;

/// Indexer for nodes without equi-join keys: a single bucket.
pub struct NoneIndexer<V> {
    lists: ElementAwareLists<V>,
    bucket: ListId,
}

impl<V> NoneIndexer<V> {
    pub fn new() -> Self {
        let mut lists = ElementAwareLists::new();
        let bucket = lists.new_list();
        Self { lists, bucket }
    }
}

impl<V> Default for NoneIndexer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V: Clone> Indexer<K, V> for NoneIndexer<V> {
    fn put(&mut self, _key: K, value: V) -> Result<EntryId> {
        self.lists.add(self.bucket, value)
    }

    fn remove(&mut self, entry: EntryId) -> Result<V> {
        self.lists.remove(entry)
    }

    fn get(&self, entry: EntryId) -> Option<&V> {
        self.lists.get(entry)
    }

    fn matches(&self, _probe: &K) -> Vec<V> {
        self.lists.to_vec(self.bucket)
    }

    fn count_matches(&self, _probe: &K) -> usize {
        self.lists.len(self.bucket)
    }

    fn len(&self) -> usize {
        self.lists.len(self.bucket)
    }
}
