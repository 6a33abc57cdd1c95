//! Concat node.

use std::rc::Rc;

use solverforge_config::NetworkConfig;
use solverforge_core::{
    BoxedLifecycle, LeftTupleLifecycle, Result, RightTupleLifecycle, Tuple, TupleRef,
};

use super::{ensure_vacant, Node};
use crate::queue::{retract_carrier, PropagationQueue, Propagator, StaticPropagationQueue};

const NODE: &str = "ConcatNode";

/// Unions two streams of the same facts into one.
///
/// Each side keeps its copy in its own store slot, so one tuple arriving
/// from both sides (a stream concatenated with itself) yields two
/// independent outputs.
pub struct ConcatNode<F> {
    left_store_index: usize,
    right_store_index: usize,
    output_store_size: usize,
    queue: StaticPropagationQueue<F>,
}

impl<F: Clone + 'static> ConcatNode<F> {
    pub fn new(
        left_store_index: usize,
        right_store_index: usize,
        output_store_size: usize,
        consumer: BoxedLifecycle<F>,
    ) -> Self {
        Self {
            left_store_index,
            right_store_index,
            output_store_size,
            queue: StaticPropagationQueue::new(NODE, consumer),
        }
    }

    fn insert_from(&mut self, tuple: &TupleRef<F>, store_index: usize) -> Result<()> {
        ensure_vacant(tuple, store_index, NODE)?;
        let out = Tuple::new(tuple.facts().clone(), self.output_store_size);
        tuple.set_store(store_index, Rc::clone(&out))?;
        self.queue.insert(out)
    }

    fn update_from(&mut self, tuple: &TupleRef<F>, store_index: usize) -> Result<()> {
        match tuple.get_store::<TupleRef<F>>(store_index)? {
            Some(out) => {
                out.set_facts(tuple.facts().clone());
                self.queue.update(out)
            }
            None => self.insert_from(tuple, store_index),
        }
    }

    fn retract_from(&mut self, tuple: &TupleRef<F>, store_index: usize) -> Result<()> {
        match tuple.remove_store::<TupleRef<F>>(store_index)? {
            Some(out) => retract_carrier(&mut self.queue, out, NODE),
            None => Ok(()),
        }
    }
}

impl<F: Clone + 'static> LeftTupleLifecycle<F> for ConcatNode<F> {
    fn insert_left(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.insert_from(tuple, self.left_store_index)
    }

    fn update_left(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.update_from(tuple, self.left_store_index)
    }

    fn retract_left(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.retract_from(tuple, self.left_store_index)
    }
}

impl<F: Clone + 'static> RightTupleLifecycle<F> for ConcatNode<F> {
    fn insert_right(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.insert_from(tuple, self.right_store_index)
    }

    fn update_right(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.update_from(tuple, self.right_store_index)
    }

    fn retract_right(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.retract_from(tuple, self.right_store_index)
    }
}

impl<F> Propagator for ConcatNode<F> {
    fn propagate_retracts(&mut self) -> Result<()> {
        self.queue.propagate_retracts()
    }

    fn propagate_updates(&mut self) -> Result<()> {
        self.queue.propagate_updates()
    }

    fn propagate_inserts(&mut self) -> Result<()> {
        self.queue.propagate_inserts()
    }

    fn pending(&self) -> usize {
        self.queue.pending()
    }
}

impl<F> Node for ConcatNode<F> {
    fn name(&self) -> &'static str {
        NODE
    }

    fn configure(&mut self, config: &NetworkConfig) -> Result<()> {
        self.queue.reserve(config.queue_capacity);
        Ok(())
    }
}
