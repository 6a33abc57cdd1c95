// Joiners for two-input nodes.
//
// A joiner tells a join or if-exists node how to key each side and which
// indexers to build, so that candidate pairs come from index lookups
// instead of a cross product. A residual [`filtering`] predicate covers
// whatever the index cannot express.
//
// # Example
//
// ```
// use solverforge_network::joiner::{equal_bi, Joiner};
//
// struct Employee { id: usize }
// struct Shift { employee: Option<usize> }
//
// let by_id = equal_bi(|s: &Shift| s.employee, |e: &Employee| Some(e.id));
// assert!(by_id.matches(&Shift { employee: Some(3) }, &Employee { id: 3 }));
// assert!(!by_id.matches(&Shift { employee: None }, &Employee { id: 3 }));
// ```

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::index::{
    Comparison, ComparisonIndexer, EqualsComparisonIndexer, EqualsIndexer, Indexer, NoneIndexer,
};

/// Keys both sides of a two-input node and builds the matching indexers.
pub trait Joiner<L, R> {
    type Key: Clone + PartialEq + 'static;

    fn left_key(&self, left: &L) -> Self::Key;

    fn right_key(&self, right: &R) -> Self::Key;

    // Holds left-side values and is probed with right keys.
    fn left_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<Self::Key, V>>;

    // Holds right-side values and is probed with left keys.
    fn right_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<Self::Key, V>>;

    // Returns true if the pair would be joined.
    fn matches(&self, left: &L, right: &R) -> bool;
}

// Joiner of the unindexed node variants: every left matches every right.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossJoiner;

pub fn cross() -> CrossJoiner {
    CrossJoiner
}

impl<L, R> Joiner<L, R> for CrossJoiner {
    type Key = ();

    #[inline]
    fn left_key(&self, _left: &L) {}

    #[inline]
    fn right_key(&self, _right: &R) {}

    fn left_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<(), V>> {
        Box::new(NoneIndexer::new())
    }

    fn right_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<(), V>> {
        Box::new(NoneIndexer::new())
    }

    #[inline]
    fn matches(&self, _left: &L, _right: &R) -> bool {
        true
    }
}

// Creates a joiner that matches when a property is equal on both sides.
//
// For self-joins, where both sides carry the same facts.
pub fn equal<A, K, F>(key: F) -> EqualJoiner<F, F, K>
where
    K: Eq + Hash + Clone + 'static,
    F: Fn(&A) -> K + Clone,
{
    EqualJoiner {
        left: key.clone(),
        right: key,
        _phantom: PhantomData,
    }
}

// Creates a joiner that matches when the extracted keys are equal.
//
// Use this for joins between different fact types. Composite keys are
// tuples.
pub fn equal_bi<L, R, K, Fl, Fr>(left: Fl, right: Fr) -> EqualJoiner<Fl, Fr, K>
where
    K: Eq + Hash + Clone + 'static,
    Fl: Fn(&L) -> K,
    Fr: Fn(&R) -> K,
{
    EqualJoiner {
        left,
        right,
        _phantom: PhantomData,
    }
}

// Created by [`equal()`] or [`equal_bi()`].
pub struct EqualJoiner<Fl, Fr, K> {
    left: Fl,
    right: Fr,
    _phantom: PhantomData<fn() -> K>,
}

impl<L, R, K, Fl, Fr> Joiner<L, R> for EqualJoiner<Fl, Fr, K>
where
    K: Eq + Hash + Clone + 'static,
    Fl: Fn(&L) -> K,
    Fr: Fn(&R) -> K,
{
    type Key = K;

    #[inline]
    fn left_key(&self, left: &L) -> K {
        (self.left)(left)
    }

    #[inline]
    fn right_key(&self, right: &R) -> K {
        (self.right)(right)
    }

    fn left_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<K, V>> {
        Box::new(EqualsIndexer::new())
    }

    fn right_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<K, V>> {
        Box::new(EqualsIndexer::new())
    }

    #[inline]
    fn matches(&self, left: &L, right: &R) -> bool {
        (self.left)(left) == (self.right)(right)
    }
}

impl<Fl, Fr, K> EqualJoiner<Fl, Fr, K> {
    /// Combines this joiner with another; a pair joins when both match.
    ///
    /// The combined key is `(self key, other key)`. Supported partners are
    /// another equal joiner and a comparison joiner.
    pub fn and<J>(self, other: J) -> AndJoiner<Self, J> {
        AndJoiner {
            first: self,
            second: other,
        }
    }
}

/// Creates a joiner that matches when `left(a) < right(b)`.
pub fn less_than<L, R, K, Fl, Fr>(left: Fl, right: Fr) -> ComparisonJoiner<Fl, Fr, K>
where
    K: Ord + Clone + 'static,
    Fl: Fn(&L) -> K,
    Fr: Fn(&R) -> K,
{
    ComparisonJoiner::new(Comparison::LessThan, left, right)
}

/// Creates a joiner that matches when `left(a) <= right(b)`.
pub fn less_than_or_equal<L, R, K, Fl, Fr>(left: Fl, right: Fr) -> ComparisonJoiner<Fl, Fr, K>
where
    K: Ord + Clone + 'static,
    Fl: Fn(&L) -> K,
    Fr: Fn(&R) -> K,
{
    ComparisonJoiner::new(Comparison::LessThanOrEqual, left, right)
}

/// Creates a joiner that matches when `left(a) > right(b)`.
pub fn greater_than<L, R, K, Fl, Fr>(left: Fl, right: Fr) -> ComparisonJoiner<Fl, Fr, K>
where
    K: Ord + Clone + 'static,
    Fl: Fn(&L) -> K,
    Fr: Fn(&R) -> K,
{
    ComparisonJoiner::new(Comparison::GreaterThan, left, right)
}

/// Creates a joiner that matches when `left(a) >= right(b)`.
///
/// # Example
///
/// ```
/// use solverforge_network::joiner::{greater_than_or_equal, Joiner};
///
/// let joiner = greater_than_or_equal(|x: &i32| *x, |y: &i32| *y);
///
/// assert!(joiner.matches(&10, &5));
/// assert!(joiner.matches(&5, &5));
/// assert!(!joiner.matches(&5, &10));
/// ```
pub fn greater_than_or_equal<L, R, K, Fl, Fr>(left: Fl, right: Fr) -> ComparisonJoiner<Fl, Fr, K>
where
    K: Ord + Clone + 'static,
    Fl: Fn(&L) -> K,
    Fr: Fn(&R) -> K,
{
    ComparisonJoiner::new(Comparison::GreaterThanOrEqual, left, right)
}

/// A joiner that matches when `left(a) <op> right(b)`.
pub struct ComparisonJoiner<Fl, Fr, K> {
    comparison: Comparison,
    left: Fl,
    right: Fr,
    _phantom: PhantomData<fn() -> K>,
}

impl<Fl, Fr, K> ComparisonJoiner<Fl, Fr, K> {
    fn new(comparison: Comparison, left: Fl, right: Fr) -> Self {
        Self {
            comparison,
            left,
            right,
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }
}

impl<L, R, K, Fl, Fr> Joiner<L, R> for ComparisonJoiner<Fl, Fr, K>
where
    K: Ord + Clone + 'static,
    Fl: Fn(&L) -> K,
    Fr: Fn(&R) -> K,
{
    type Key = K;

    #[inline]
    fn left_key(&self, left: &L) -> K {
        (self.left)(left)
    }

    #[inline]
    fn right_key(&self, right: &R) -> K {
        (self.right)(right)
    }

    // Stored left keys are probed with right keys: `l op r` iff `r flip(op) l`.
    fn left_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<K, V>> {
        Box::new(ComparisonIndexer::new(self.comparison.flip()))
    }

    fn right_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<K, V>> {
        Box::new(ComparisonIndexer::new(self.comparison))
    }

    #[inline]
    fn matches(&self, left: &L, right: &R) -> bool {
        self.comparison
            .test(&(self.left)(left), &(self.right)(right))
    }
}

/// Two joiners that must both match. Created by [`EqualJoiner::and`].
pub struct AndJoiner<J1, J2> {
    first: J1,
    second: J2,
}

impl<L, R, E1, E2, Fl1, Fr1, Fl2, Fr2> Joiner<L, R>
    for AndJoiner<EqualJoiner<Fl1, Fr1, E1>, EqualJoiner<Fl2, Fr2, E2>>
where
    E1: Eq + Hash + Clone + 'static,
    E2: Eq + Hash + Clone + 'static,
    Fl1: Fn(&L) -> E1,
    Fr1: Fn(&R) -> E1,
    Fl2: Fn(&L) -> E2,
    Fr2: Fn(&R) -> E2,
{
    type Key = (E1, E2);

    #[inline]
    fn left_key(&self, left: &L) -> (E1, E2) {
        ((self.first.left)(left), (self.second.left)(left))
    }

    #[inline]
    fn right_key(&self, right: &R) -> (E1, E2) {
        ((self.first.right)(right), (self.second.right)(right))
    }

    fn left_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<(E1, E2), V>> {
        Box::new(EqualsIndexer::new())
    }

    fn right_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<(E1, E2), V>> {
        Box::new(EqualsIndexer::new())
    }

    #[inline]
    fn matches(&self, left: &L, right: &R) -> bool {
        (self.first.left)(left) == (self.first.right)(right)
            && (self.second.left)(left) == (self.second.right)(right)
    }
}

impl<L, R, E, C, Fl1, Fr1, Fl2, Fr2> Joiner<L, R>
    for AndJoiner<EqualJoiner<Fl1, Fr1, E>, ComparisonJoiner<Fl2, Fr2, C>>
where
    E: Eq + Hash + Clone + 'static,
    C: Ord + Clone + 'static,
    Fl1: Fn(&L) -> E,
    Fr1: Fn(&R) -> E,
    Fl2: Fn(&L) -> C,
    Fr2: Fn(&R) -> C,
{
    type Key = (E, C);

    #[inline]
    fn left_key(&self, left: &L) -> (E, C) {
        ((self.first.left)(left), (self.second.left)(left))
    }

    #[inline]
    fn right_key(&self, right: &R) -> (E, C) {
        ((self.first.right)(right), (self.second.right)(right))
    }

    // Same flip as a plain comparison joiner, within each equal bucket.
    fn left_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<(E, C), V>> {
        Box::new(EqualsComparisonIndexer::new(self.second.comparison.flip()))
    }

    fn right_indexer<V: Clone + 'static>(&self) -> Box<dyn Indexer<(E, C), V>> {
        Box::new(EqualsComparisonIndexer::new(self.second.comparison))
    }

    #[inline]
    fn matches(&self, left: &L, right: &R) -> bool {
        (self.first.left)(left) == (self.first.right)(right)
            && self
                .second
                .comparison
                .test(&(self.second.left)(left), &(self.second.right)(right))
    }
}

/// Residual predicate tested on every candidate pair an index yields.
pub struct Filtering<L, R> {
    predicate: Box<dyn Fn(&L, &R) -> bool>,
}

/// Creates a filtering predicate for a join or if-exists node.
///
/// # Example
///
/// ```
/// use solverforge_network::joiner::filtering;
///
/// let overlapping = filtering(|a: &(i64, i64), b: &(i64, i64)| a.0 < b.1 && b.0 < a.1);
/// assert!(overlapping.test(&(0, 8), &(4, 12)));
/// assert!(!overlapping.test(&(0, 8), &(8, 16)));
/// ```
pub fn filtering<L, R, P>(predicate: P) -> Filtering<L, R>
where
    P: Fn(&L, &R) -> bool + 'static,
{
    Filtering {
        predicate: Box::new(predicate),
    }
}

impl<L, R> Filtering<L, R> {
    #[inline]
    pub fn test(&self, left: &L, right: &R) -> bool {
        (self.predicate)(left, right)
    }
}

impl<L, R> fmt::Debug for Filtering<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filtering")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_joiner_indexers_agree_with_matches() {
        let joiner = less_than(|a: &i32| *a, |b: &i32| *b);
        let mut left = Joiner::<i32, i32>::left_indexer::<i32>(&joiner);
        let mut right = Joiner::<i32, i32>::right_indexer::<i32>(&joiner);
        for v in [1, 5, 9] {
            left.put(v, v).unwrap();
            right.put(v, v).unwrap();
        }

        // Right values a left value of 5 joins with.
        assert_eq!(right.matches(&5), vec![9]);
        // Left values a right value of 5 joins with.
        assert_eq!(left.matches(&5), vec![1]);
        assert!(joiner.matches(&1, &5));
        assert!(!joiner.matches(&5, &5));
    }

    #[test]
    fn test_equal_joiner_self_join() {
        let joiner = equal(|s: &(usize, i64)| s.0);
        assert!(joiner.matches(&(1, 0), &(1, 8)));
        assert!(!joiner.matches(&(1, 0), &(2, 0)));
        assert_eq!(Joiner::<(usize, i64), (usize, i64)>::left_key(&joiner, &(4, 0)), 4);
    }

    type Slot = (usize, i64);

    #[test]
    fn test_equal_and_less_than_indexers_agree_with_matches() {
        // (employee, start) pairs.
        let joiner = equal(|s: &Slot| s.0).and(less_than(|s: &Slot| s.1, |s: &Slot| s.1));
        let left_key = |s: &Slot| Joiner::<Slot, Slot>::left_key(&joiner, s);
        let right_key = |s: &Slot| Joiner::<Slot, Slot>::right_key(&joiner, s);
        let slots = [(1, 0), (1, 8), (1, 16), (2, 4)];
        let mut left = Joiner::<Slot, Slot>::left_indexer::<Slot>(&joiner);
        let mut right = Joiner::<Slot, Slot>::right_indexer::<Slot>(&joiner);
        for slot in slots {
            left.put(left_key(&slot), slot).unwrap();
            right.put(right_key(&slot), slot).unwrap();
        }

        for slot in slots {
            let expected: Vec<_> = slots
                .iter()
                .copied()
                .filter(|other| joiner.matches(&slot, other))
                .collect();
            assert_eq!(right.matches(&left_key(&slot)), expected);

            let expected: Vec<_> = slots
                .iter()
                .copied()
                .filter(|other| joiner.matches(other, &slot))
                .collect();
            assert_eq!(left.matches(&right_key(&slot)), expected);
        }
        assert!(joiner.matches(&(1, 0), &(1, 8)));
        assert!(!joiner.matches(&(1, 0), &(2, 4)));
    }

    #[test]
    fn test_equal_and_equal_keys_are_pairs() {
        let joiner = equal_bi(|l: &(u8, char)| l.0, |r: &(char, u8)| r.1)
            .and(equal_bi(|l: &(u8, char)| l.1, |r: &(char, u8)| r.0));
        assert!(joiner.matches(&(1, 'a'), &('a', 1)));
        assert!(!joiner.matches(&(1, 'a'), &('b', 1)));
        assert_eq!(
            Joiner::<(u8, char), (char, u8)>::right_key(&joiner, &('b', 2)),
            (2, 'b')
        );
    }

    #[test]
    fn test_cross_joiner_matches_everything() {
        let mut right = Joiner::<i32, char>::right_indexer::<char>(&cross());
        right.put((), 'a').unwrap();
        right.put((), 'b').unwrap();
        assert_eq!(right.count_matches(&()), 2);
    }
}
