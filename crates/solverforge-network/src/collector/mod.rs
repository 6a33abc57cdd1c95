// Collectors for grouping and aggregating tuples.
//
// A group node owns one accumulator per group. Every contributing tuple is
// reduced to a `Value` by `extract`, and that value is kept in the tuple's
// undo slot so the exact contribution can be retracted later, even after the
// tuple's facts have changed.

mod count;
mod load_balance;
mod sum;
mod to_vec;

#[cfg(test)]
mod tests;

pub use count::{count, CountAccumulator, CountCollector};
pub use load_balance::{load_balance, LoadBalance, LoadBalanceAccumulator, LoadBalanceCollector};
pub use sum::{sum, SumAccumulator, SumCollector};
pub use to_vec::{to_vec, ToVecAccumulator, ToVecCollector};

/// Reduces the facts of a tuple to a value and folds values into a result.
pub trait UniCollector<A> {
    /// What one tuple contributes.
    type Value;
    /// What the group announces downstream.
    type Result;
    type Accumulator: Accumulator<Self::Value, Self::Result>;

    fn extract(&self, entity: &A) -> Self::Value;

    fn create_accumulator(&self) -> Self::Accumulator;
}

/// Mutable result container of one group.
pub trait Accumulator<V, R> {
    fn accumulate(&mut self, value: &V);

    /// Undoes an earlier `accumulate` of the same value.
    fn retract(&mut self, value: &V);

    fn finish(&self) -> R;
}
