use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use solverforge_core::{ElementAwareLists, EntryId, ListId, Result};

use super::comparison::matching_range;
use super::{Comparison, Indexer};

/// Index on an `(equal, compared)` key pair.
///
/// Values are first bucketed by the equal component; each bucket is an
/// ordered map over the compared component. A stored value matches a key
/// when the equal components are equal and `key.1 <op> stored.1` holds.
/// Empty buckets are dropped on both levels.
pub struct EqualsComparisonIndexer<E, C, V> {
    comparison: Comparison,
    buckets: HashMap<E, BTreeMap<C, ListId>>,
    lists: ElementAwareLists<((E, C), V)>,
}

impl<E, C, V> EqualsComparisonIndexer<E, C, V>
where
    E: Eq + Hash,
    C: Ord,
{
    pub fn new(comparison: Comparison) -> Self {
        Self {
            comparison,
            buckets: HashMap::new(),
            lists: ElementAwareLists::new(),
        }
    }

    #[inline]
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Number of distinct equal components.
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    fn matching_buckets<'a>(&'a self, key: &'a (E, C)) -> impl Iterator<Item = ListId> + 'a {
        let (equal, compared) = key;
        self.buckets.get(equal).into_iter().flat_map(move |ordered| {
            ordered
                .range::<C, _>(matching_range(self.comparison, compared))
                .map(|(_, &bucket)| bucket)
        })
    }
}

impl<E, C, V> Indexer<(E, C), V> for EqualsComparisonIndexer<E, C, V>
where
    E: Eq + Hash + Clone,
    C: Ord + Clone,
    V: Clone,
{
    fn put(&mut self, key: (E, C), value: V) -> Result<EntryId> {
        let existing = self
            .buckets
            .get(&key.0)
            .and_then(|ordered| ordered.get(&key.1))
            .copied();
        let bucket = match existing {
            Some(bucket) => bucket,
            None => {
                let bucket = self.lists.new_list();
                self.buckets
                    .entry(key.0.clone())
                    .or_default()
                    .insert(key.1.clone(), bucket);
                bucket
            }
        };
        self.lists.add(bucket, (key, value))
    }

    fn remove(&mut self, entry: EntryId) -> Result<V> {
        let bucket = self.lists.list_of(entry)?;
        let ((equal, compared), value) = self.lists.remove(entry)?;
        if self.lists.is_empty(bucket) {
            self.lists.remove_list(bucket)?;
            if let Some(ordered) = self.buckets.get_mut(&equal) {
                ordered.remove(&compared);
                if ordered.is_empty() {
                    self.buckets.remove(&equal);
                }
            }
        }
        Ok(value)
    }

    fn get(&self, entry: EntryId) -> Option<&V> {
        self.lists.get(entry).map(|(_, value)| value)
    }

    fn matches(&self, key: &(E, C)) -> Vec<V> {
        self.matching_buckets(key)
            .flat_map(|bucket| self.lists.iter(bucket).map(|(_, v)| v.clone()))
            .collect()
    }

    fn count_matches(&self, key: &(E, C)) -> usize {
        self.matching_buckets(key)
            .map(|bucket| self.lists.len(bucket))
            .sum()
    }

    fn len(&self) -> usize {
        self.lists.entry_count()
    }
}
