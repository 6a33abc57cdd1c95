//! Indexes over one side of a two-input node.
//!
//! Each side of a join or if-exists node keeps its tuples (or counters) in
//! an indexer keyed by the joiner's key for that side. Inserting a tuple on
//! one side probes the other side's indexer with its own key. Every put
//! returns an [`EntryId`] that removes the value again in O(1).
//!
//! - [`NoneIndexer`] ignores keys; every value matches every probe.
//! - [`EqualsIndexer`] matches values stored under a key equal to the probe.
//! - [`ComparisonIndexer`] matches values whose key compares to the probe.
//! - [`EqualsComparisonIndexer`] takes `(equal, compared)` keys: an equals
//!   bucket per first component, ranged over by the second.

mod comparison;
mod equals;
mod equals_comparison;
mod none;


use solverforge_core::{EntryId, Result};

pub use comparison::{Comparison, ComparisonIndexer};
pub use equals::EqualsIndexer;
pub use equals_comparison::EqualsComparisonIndexer;
pub use none::NoneIndexer;

/// Keyed storage for one side of a two-input node.
pub trait Indexer<K, V> {
    /// Stores `value` under `key`.
    fn put(&mut self, key: K, value: V) -> Result<EntryId>;

    /// Removes a value stored earlier.
    fn remove(&mut self, entry: EntryId) -> Result<V>;

    fn get(&self, entry: EntryId) -> Option<&V>;

    /// Values matching `probe`, a key from the other side, in index order.
    fn matches(&self, probe: &K) -> Vec<V>;

    /// Number of values matching `probe`.
    fn count_matches(&self, probe: &K) -> usize;

    /// Number of values stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
