//! Filter node.

use std::rc::Rc;

use solverforge_config::NetworkConfig;
use solverforge_core::{BoxedLifecycle, Result, Tuple, TupleLifecycle, TupleRef};

use super::{ensure_vacant, Node};
use crate::queue::{retract_carrier, PropagationQueue, Propagator, StaticPropagationQueue};

const NODE: &str = "FilterNode";

/// Passes on a copy of every input tuple whose facts satisfy a predicate.
///
/// The copy lives in the input tuple's store slot while the predicate
/// holds. An input tuple with an empty slot was rejected, so updating it
/// degrades to an insert and retracting it is a no-op.
pub struct FilterNode<A, P> {
    predicate: P,
    store_index: usize,
    output_store_size: usize,
    queue: StaticPropagationQueue<A>,
}

impl<A, P> FilterNode<A, P>
where
    A: Clone,
    P: Fn(&A) -> bool,
{
    pub fn new(
        predicate: P,
        store_index: usize,
        output_store_size: usize,
        consumer: BoxedLifecycle<A>,
    ) -> Self {
        Self {
            predicate,
            store_index,
            output_store_size,
            queue: StaticPropagationQueue::new(NODE, consumer),
        }
    }

    fn accepts(&self, tuple: &TupleRef<A>) -> bool {
        (self.predicate)(&*tuple.facts())
    }
}

impl<A, P> TupleLifecycle<A> for FilterNode<A, P>
where
    A: Clone + 'static,
    P: Fn(&A) -> bool,
{
    fn insert(&mut self, tuple: &TupleRef<A>) -> Result<()> {
        ensure_vacant(tuple, self.store_index, NODE)?;
        if !self.accepts(tuple) {
            return Ok(());
        }
        let out = Tuple::new(tuple.facts().clone(), self.output_store_size);
        tuple.set_store(self.store_index, Rc::clone(&out))?;
        self.queue.insert(out)
    }

    fn update(&mut self, tuple: &TupleRef<A>) -> Result<()> {
        let Some(out) = tuple.get_store::<TupleRef<A>>(self.store_index)? else {
            // Rejected before; it may pass now.
            return self.insert(tuple);
        };
        if self.accepts(tuple) {
            out.set_facts(tuple.facts().clone());
            self.queue.update(out)
        } else {
            tuple.remove_store::<TupleRef<A>>(self.store_index)?;
            retract_carrier(&mut self.queue, out, NODE)
        }
    }

    fn retract(&mut self, tuple: &TupleRef<A>) -> Result<()> {
        match tuple.remove_store::<TupleRef<A>>(self.store_index)? {
            Some(out) => retract_carrier(&mut self.queue, out, NODE),
            None => Ok(()),
        }
    }
}

impl<A, P> Propagator for FilterNode<A, P> {
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

impl<A, P> Node for FilterNode<A, P> {
    fn name(&self) -> &'static str {
        NODE
    }

    fn configure(&mut self, config: &NetworkConfig) -> Result<()> {
        self.queue.reserve(config.queue_capacity);
        Ok(())
    }
}
