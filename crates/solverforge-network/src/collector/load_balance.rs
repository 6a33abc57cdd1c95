//! LoadBalance collector for measuring how unevenly load is spread.

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use super::{Accumulator, UniCollector};

/// Loads per balanced key, and the unfairness of that distribution.
///
/// Unfairness is the square root of the sum of squared deviations from the
/// mean load, rounded to an integer. Zero means perfectly balanced.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalance<K: Eq + Hash> {
    loads: HashMap<K, i64>,
    unfairness: i64,
}

impl<K: Eq + Hash> LoadBalance<K> {
    pub fn loads(&self) -> &HashMap<K, i64> {
        &self.loads
    }

    #[inline]
    pub fn unfairness(&self) -> i64 {
        self.unfairness
    }
}

/// Creates a load balance collector.
///
/// `key_fn` picks what is being balanced (an employee, a machine), and
/// `metric_fn` how much load one tuple puts on it. Zero-load tuples are
/// ignored.
///
/// # Example
///
/// ```
/// use solverforge_network::collector::{load_balance, UniCollector, Accumulator};
///
/// struct Shift { employee: usize }
///
/// let collector = load_balance(|s: &Shift| s.employee, |_s: &Shift| 1i64);
///
/// let mut acc = collector.create_accumulator();
/// acc.accumulate(&collector.extract(&Shift { employee: 0 }));
/// acc.accumulate(&collector.extract(&Shift { employee: 0 }));
/// acc.accumulate(&collector.extract(&Shift { employee: 1 }));
///
/// // Loads 2 and 1 around a mean of 1.5: sqrt(0.5) rounds to 1.
/// assert_eq!(acc.finish().unfairness(), 1);
/// ```
pub fn load_balance<A, K, F, M>(key_fn: F, metric_fn: M) -> LoadBalanceCollector<A, K, F, M>
where
    K: Clone + Eq + Hash,
    F: Fn(&A) -> K,
    M: Fn(&A) -> i64,
{
    LoadBalanceCollector {
        key_fn,
        metric_fn,
        _phantom: PhantomData,
    }
}

pub struct LoadBalanceCollector<A, K, F, M> {
    key_fn: F,
    metric_fn: M,
    _phantom: PhantomData<fn(&A) -> K>,
}

impl<A, K, F, M> UniCollector<A> for LoadBalanceCollector<A, K, F, M>
where
    K: Clone + Eq + Hash,
    F: Fn(&A) -> K,
    M: Fn(&A) -> i64,
{
    type Value = (K, i64);
    type Result = LoadBalance<K>;
    type Accumulator = LoadBalanceAccumulator<K>;

    #[inline]
    fn extract(&self, entity: &A) -> Self::Value {
        ((self.key_fn)(entity), (self.metric_fn)(entity))
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        LoadBalanceAccumulator {
            loads: HashMap::new(),
            sum: 0,
            sum_of_squares: 0,
        }
    }
}

/// Keeps the running sum and sum of squares of all loads, so that adding or
/// removing a contribution is O(1).
#[derive(Debug)]
pub struct LoadBalanceAccumulator<K> {
    // Key -> (contributing tuples, total load)
    loads: HashMap<K, (usize, i64)>,
    sum: i64,
    sum_of_squares: i128,
}

impl<K: Clone + Eq + Hash> LoadBalanceAccumulator<K> {
    fn shift_load(&mut self, old: i64, new: i64) {
        self.sum += new - old;
        self.sum_of_squares += i128::from(new) * i128::from(new) - i128::from(old) * i128::from(old);
    }

    fn unfairness(&self) -> i64 {
        let n = self.loads.len();
        if n == 0 {
            return 0;
        }
        // sum((x - mean)^2) = sum(x^2) - sum(x)^2 / n
        let sum = self.sum as f64;
        let squared_deviation = (self.sum_of_squares as f64 - sum * sum / n as f64).max(0.0);
        squared_deviation.sqrt().round() as i64
    }
}

impl<K: Clone + Eq + Hash> Accumulator<(K, i64), LoadBalance<K>> for LoadBalanceAccumulator<K> {
    fn accumulate(&mut self, value: &(K, i64)) {
        let (key, metric) = value;
        if *metric == 0 {
            return;
        }
        let entry = self.loads.entry(key.clone()).or_insert((0, 0));
        let old = entry.1;
        entry.0 += 1;
        entry.1 += metric;
        let new = entry.1;
        self.shift_load(old, new);
    }

    fn retract(&mut self, value: &(K, i64)) {
        let (key, metric) = value;
        if *metric == 0 {
            return;
        }
        let Some(entry) = self.loads.get_mut(key) else {
            return;
        };
        let old = entry.1;
        entry.0 -= 1;
        entry.1 -= metric;
        let (remaining, new) = *entry;
        if remaining == 0 {
            self.loads.remove(key);
            self.shift_load(old, 0);
        } else {
            self.shift_load(old, new);
        }
    }

    fn finish(&self) -> LoadBalance<K> {
        LoadBalance {
            loads: self
                .loads
                .iter()
                .map(|(key, &(_, load))| (key.clone(), load))
                .collect(),
            unfairness: self.unfairness(),
        }
    }
}
