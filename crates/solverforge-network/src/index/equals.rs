use std::collections::HashMap;
use std::hash::Hash;

use solverforge_core::{ElementAwareLists, EntryId, ListId, Result};

use super::Indexer;

/// Hash index on an equi-join key. Composite keys are plain tuples.
///
/// Buckets are dropped as soon as they run empty, so the number of keys
/// never exceeds the number of stored values.
pub struct EqualsIndexer<K, V> {
    buckets: HashMap<K, ListId>,
    lists: ElementAwareLists<(K, V)>,
}

impl<K, V> EqualsIndexer<K, V> {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            lists: ElementAwareLists::new(),
        }
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }
}

impl<K, V> Default for EqualsIndexer<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Indexer<K, V> for EqualsIndexer<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&mut self, key: K, value: V) -> Result<EntryId> {
        let bucket = match self.buckets.get(&key) {
            Some(&bucket) => bucket,
            None => {
                let bucket = self.lists.new_list();
                self.buckets.insert(key.clone(), bucket);
                bucket
            }
        };
        self.lists.add(bucket, (key, value))
    }

    fn remove(&mut self, entry: EntryId) -> Result<V> {
        let bucket = self.lists.list_of(entry)?;
        let (key, value) = self.lists.remove(entry)?;
        if self.lists.is_empty(bucket) {
            self.lists.remove_list(bucket)?;
            self.buckets.remove(&key);
        }
        Ok(value)
    }

    fn get(&self, entry: EntryId) -> Option<&V> {
        self.lists.get(entry).map(|(_, value)| value)
    }

    fn matches(&self, probe: &K) -> Vec<V> {
        match self.buckets.get(probe) {
            Some(&bucket) => self.lists.iter(bucket).map(|(_, v)| v.clone()).collect(),
            None => Vec::new(),
        }
    }

    fn count_matches(&self, probe: &K) -> usize {
        self.buckets
            .get(probe)
            .map_or(0, |&bucket| self.lists.len(bucket))
    }

    fn len(&self) -> usize {
        self.lists.entry_count()
    }
}
