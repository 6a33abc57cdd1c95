//! Tests for lifecycle adapters.

use std::cell::RefCell;
use std::rc::Rc;

use super::error::{Result, SolverForgeError};
use super::lifecycle::*;
use super::tuple::{Tuple, TupleRef};

#[derive(Default)]
struct Log {
    events: Vec<String>,
}

impl TupleLifecycle<i32> for Log {
    fn insert(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("insert {}", tuple.facts()));
        Ok(())
    }

    fn update(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("update {}", tuple.facts()));
        Ok(())
    }

    fn retract(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("retract {}", tuple.facts()));
        Ok(())
    }
}

impl LeftTupleLifecycle<i32> for Log {
    fn insert_left(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("insert_left {}", tuple.facts()));
        Ok(())
    }

    fn update_left(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("update_left {}", tuple.facts()));
        Ok(())
    }

    fn retract_left(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("retract_left {}", tuple.facts()));
        Ok(())
    }
}

impl RightTupleLifecycle<i32> for Log {
    fn insert_right(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("insert_right {}", tuple.facts()));
        Ok(())
    }

    fn update_right(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("update_right {}", tuple.facts()));
        Ok(())
    }

    fn retract_right(&mut self, tuple: &TupleRef<i32>) -> Result<()> {
        self.events.push(format!("retract_right {}", tuple.facts()));
        Ok(())
    }
}

#[test]
fn test_left_and_right_adapters_route_to_sides() {
    let node = shared(Log::default());
    let mut left = of_left::<i32, _>(&node);
    let mut right = of_right::<i32, _>(&node);
    let tuple = Tuple::new(7, 0);

    left.insert(&tuple).unwrap();
    right.update(&tuple).unwrap();
    left.retract(&tuple).unwrap();

    assert_eq!(
        node.borrow().events,
        vec!["insert_left 7", "update_right 7", "retract_left 7"]
    );
}

#[test]
fn test_aggregated_lifecycle_fans_out_in_order() {
    let first = shared(Log::default());
    let second = shared(Log::default());
    let mut fanout = AggregatedTupleLifecycle::new(vec![
        of_node::<i32, _>(&first),
        of_node::<i32, _>(&second),
    ]);
    assert_eq!(fanout.len(), 2);

    let tuple = Tuple::new(1, 0);
    fanout.insert(&tuple).unwrap();
    fanout.retract(&tuple).unwrap();

    assert_eq!(first.borrow().events, vec!["insert 1", "retract 1"]);
    assert_eq!(second.borrow().events, vec!["insert 1", "retract 1"]);
}

#[test]
fn test_reentrant_call_is_an_error() {
    let node: Rc<RefCell<Log>> = shared(Log::default());
    let mut consumer = of_node::<i32, _>(&node);
    let _guard = node.borrow_mut();

    let err = consumer.insert(&Tuple::new(1, 0)).unwrap_err();
    assert!(matches!(err, SolverForgeError::Reentrant { .. }));
}
