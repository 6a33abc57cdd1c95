// Tests for the collectors.

use super::{count, load_balance, sum, to_vec, Accumulator, UniCollector};

#[test]
fn test_count_retract_does_not_underflow() {
    let collector = count::<i32>();
    let mut acc = collector.create_accumulator();

    acc.retract(&collector.extract(&1));
    assert_eq!(acc.finish(), 0);
}

#[test]
fn test_sum_retracts_stored_value_not_current_one() {
    // The group node retracts the value extracted at accumulate time.
    let collector = sum(|x: &i64| *x * 10);
    let mut acc = collector.create_accumulator();

    let stored = collector.extract(&3);
    acc.accumulate(&stored);
    acc.accumulate(&collector.extract(&1));
    acc.retract(&stored);

    assert_eq!(acc.finish(), 10);
}

#[test]
fn test_to_vec_retract_removes_one_occurrence() {
    let collector = to_vec(|x: &i32| *x);
    let mut acc = collector.create_accumulator();
    acc.accumulate(&collector.extract(&1));
    acc.accumulate(&collector.extract(&1));
    acc.retract(&collector.extract(&1));

    assert_eq!(acc.finish(), vec![1]);
}

// ============================================================================
// LoadBalance collector tests
// ============================================================================

#[test]
fn test_perfectly_balanced() {
    let collector = load_balance(|x: &i32| *x, |_| 1i64);
    let mut acc = collector.create_accumulator();

    acc.accumulate(&collector.extract(&0));
    acc.accumulate(&collector.extract(&1));

    assert_eq!(acc.finish().unfairness(), 0);
}

#[test]
fn test_unbalanced_then_rebalanced() {
    let collector = load_balance(|x: &i32| *x, |_| 1i64);
    let mut acc = collector.create_accumulator();

    acc.accumulate(&collector.extract(&0));
    acc.accumulate(&collector.extract(&0));
    acc.accumulate(&collector.extract(&1));
    // Loads [2, 1], mean 1.5: sqrt(0.25 + 0.25) ~ 0.707
    assert_eq!(acc.finish().unfairness(), 1);

    acc.retract(&collector.extract(&0));
    assert_eq!(acc.finish().unfairness(), 0);
}

#[test]
fn test_larger_spread() {
    let collector = load_balance(|x: &(char, i64)| x.0, |x| x.1);
    let mut acc = collector.create_accumulator();

    acc.accumulate(&collector.extract(&('a', 10)));
    acc.accumulate(&collector.extract(&('b', 0)));
    acc.accumulate(&collector.extract(&('c', 4)));
    // Zero loads are ignored: loads [10, 4], mean 7, deviations 9 + 9
    assert_eq!(acc.finish().unfairness(), 4);
    assert_eq!(acc.finish().loads().len(), 2);
}

#[test]
fn test_retract_everything() {
    let collector = load_balance(|x: &&str| *x, |_| 3i64);
    let mut acc = collector.create_accumulator();
    let a = collector.extract(&"a");
    let b = collector.extract(&"b");

    acc.accumulate(&a);
    acc.accumulate(&b);
    acc.accumulate(&b);
    assert_eq!(acc.finish().loads().get("b"), Some(&6));

    acc.retract(&b);
    acc.retract(&b);
    acc.retract(&a);
    let result = acc.finish();
    assert!(result.loads().is_empty());
    assert_eq!(result.unfairness(), 0);
}

#[test]
fn test_single_key() {
    let collector = load_balance(|x: &i32| *x, |_| 1i64);
    let mut acc = collector.create_accumulator();

    acc.accumulate(&collector.extract(&0));
    acc.accumulate(&collector.extract(&0));
    acc.accumulate(&collector.extract(&0));

    let result = acc.finish();
    assert_eq!(result.loads().get(&0), Some(&3));
    assert_eq!(result.unfairness(), 0);
}
