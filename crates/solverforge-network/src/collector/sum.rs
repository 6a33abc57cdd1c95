// Sum collector for summing values extracted from tuples.

use std::marker::PhantomData;
use std::ops::{AddAssign, SubAssign};

use super::{Accumulator, UniCollector};

// Creates a collector that sums values extracted from tuples.
//
// # Example
//
// ```
// use solverforge_network::collector::{sum, UniCollector, Accumulator};
//
// struct Item { value: i64 }
//
// let collector = sum(|item: &Item| item.value);
// let mut acc = collector.create_accumulator();
//
// acc.accumulate(&collector.extract(&Item { value: 5 }));
// acc.accumulate(&collector.extract(&Item { value: 3 }));
// acc.accumulate(&collector.extract(&Item { value: 7 }));
// assert_eq!(acc.finish(), 15);
//
// acc.retract(&collector.extract(&Item { value: 3 }));
// assert_eq!(acc.finish(), 12);
// ```
pub fn sum<A, T, F>(mapper: F) -> SumCollector<A, T, F>
where
    T: Default + Copy + AddAssign + SubAssign,
    F: Fn(&A) -> T,
{
    SumCollector {
        mapper,
        _phantom: PhantomData,
    }
}

// Collector that sums values extracted from tuples.
//
// Created by the [`sum()`] function.
// The mapper is stored once in the collector, not cloned into accumulators.
pub struct SumCollector<A, T, F> {
    mapper: F,
    _phantom: PhantomData<fn(&A) -> T>,
}

impl<A, T, F> UniCollector<A> for SumCollector<A, T, F>
where
    T: Default + Copy + AddAssign + SubAssign,
    F: Fn(&A) -> T,
{
    type Value = T;
    type Result = T;
    type Accumulator = SumAccumulator<T>;

    #[inline]
    fn extract(&self, entity: &A) -> T {
        (self.mapper)(entity)
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        SumAccumulator { sum: T::default() }
    }
}

// Accumulator for summing values.
//
// Works with pre-extracted values, not tuples directly.
#[derive(Debug)]
pub struct SumAccumulator<T> {
    sum: T,
}

impl<T> Accumulator<T, T> for SumAccumulator<T>
where
    T: Default + Copy + AddAssign + SubAssign,
{
    #[inline]
    fn accumulate(&mut self, value: &T) {
        self.sum += *value;
    }

    #[inline]
    fn retract(&mut self, value: &T) {
        self.sum -= *value;
    }

    #[inline]
    fn finish(&self) -> T {
        self.sum
    }
}
