use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use solverforge_core::{ElementAwareLists, EntryId, ListId, Result};

use super::Indexer;

/// Comparison operator of a comparison joiner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    /// Returns `a <op> b`.
    #[inline]
    pub fn test<K: Ord + ?Sized>(self, a: &K, b: &K) -> bool {
        match self {
            Comparison::LessThan => a < b,
            Comparison::LessThanOrEqual => a <= b,
            Comparison::GreaterThan => a > b,
            Comparison::GreaterThanOrEqual => a >= b,
        }
    }

    /// The operator with its operands swapped: `a < b` iff `b > a`.
    #[inline]
    pub fn flip(self) -> Comparison {
        match self {
            Comparison::LessThan => Comparison::GreaterThan,
            Comparison::LessThanOrEqual => Comparison::GreaterThanOrEqual,
            Comparison::GreaterThan => Comparison::LessThan,
            Comparison::GreaterThanOrEqual => Comparison::LessThanOrEqual,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::LessThan => "<",
            Comparison::LessThanOrEqual => "<=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqual => ">=",
        })
    }
}

/// Ordered index answering range probes.
///
/// A stored value matches a probe when `probe <op> stored_key` holds.
pub struct ComparisonIndexer<K, V> {
    comparison: Comparison,
    buckets: BTreeMap<K, ListId>,
    lists: ElementAwareLists<(K, V)>,
}

impl<K: Ord, V> ComparisonIndexer<K, V> {
    pub fn new(comparison: Comparison) -> Self {
        Self {
            comparison,
            buckets: BTreeMap::new(),
            lists: ElementAwareLists::new(),
        }
    }

    #[inline]
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    fn matching_buckets<'a>(&'a self, probe: &'a K) -> impl Iterator<Item = ListId> + 'a {
        self.buckets
            .range::<K, _>(matching_range(self.comparison, probe))
            .map(|(_, &bucket)| bucket)
    }
}

/// Range of stored keys `k` for which `key <op> k` holds.
pub(super) fn matching_range<K>(comparison: Comparison, key: &K) -> (Bound<&K>, Bound<&K>) {
    match comparison {
        Comparison::LessThan => (Bound::Excluded(key), Bound::Unbounded),
        Comparison::LessThanOrEqual => (Bound::Included(key), Bound::Unbounded),
        Comparison::GreaterThan => (Bound::Unbounded, Bound::Excluded(key)),
        Comparison::GreaterThanOrEqual => (Bound::Unbounded, Bound::Included(key)),
    }
}

impl<K, V> Indexer<K, V> for ComparisonIndexer<K, V>
where
    K: Ord + Clone,
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
        self.matching_buckets(probe)
            .flat_map(|bucket| self.lists.iter(bucket).map(|(_, v)| v.clone()))
            .collect()
    }

    fn count_matches(&self, probe: &K) -> usize {
        self.matching_buckets(probe)
            .map(|bucket| self.lists.len(bucket))
            .sum()
    }

    fn len(&self) -> usize {
        self.lists.entry_count()
    }
}
