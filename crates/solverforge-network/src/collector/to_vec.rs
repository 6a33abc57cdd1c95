//! Collector gathering mapped values into a list.

use std::marker::PhantomData;

use super::{Accumulator, UniCollector};

/// Creates a collector that gathers one mapped value per tuple.
///
/// Values appear in accumulation order. Retracting removes one equal value.
///
/// # Example
///
/// ```
/// use solverforge_network::collector::{to_vec, UniCollector, Accumulator};
///
/// let collector = to_vec(|s: &&str| s.len());
/// let mut acc = collector.create_accumulator();
///
/// acc.accumulate(&collector.extract(&"ab"));
/// acc.accumulate(&collector.extract(&"abc"));
/// acc.accumulate(&collector.extract(&"ab"));
/// acc.retract(&collector.extract(&"ab"));
/// assert_eq!(acc.finish(), vec![3, 2]);
/// ```
pub fn to_vec<A, T, F>(mapper: F) -> ToVecCollector<A, T, F>
where
    T: Clone + PartialEq,
    F: Fn(&A) -> T,
{
    ToVecCollector {
        mapper,
        _phantom: PhantomData,
    }
}

/// Created by the [`to_vec()`] function.
pub struct ToVecCollector<A, T, F> {
    mapper: F,
    _phantom: PhantomData<fn(&A) -> T>,
}

impl<A, T, F> UniCollector<A> for ToVecCollector<A, T, F>
where
    T: Clone + PartialEq,
    F: Fn(&A) -> T,
{
    type Value = T;
    type Result = Vec<T>;
    type Accumulator = ToVecAccumulator<T>;

    #[inline]
    fn extract(&self, entity: &A) -> T {
        (self.mapper)(entity)
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        ToVecAccumulator { values: Vec::new() }
    }
}

#[derive(Debug)]
pub struct ToVecAccumulator<T> {
    values: Vec<T>,
}

impl<T: Clone + PartialEq> Accumulator<T, Vec<T>> for ToVecAccumulator<T> {
    fn accumulate(&mut self, value: &T) {
        self.values.push(value.clone());
    }

    fn retract(&mut self, value: &T) {
        if let Some(position) = self.values.iter().position(|v| v == value) {
            self.values.remove(position);
        }
    }

    fn finish(&self) -> Vec<T> {
        self.values.clone()
    }
}
