//! Map node.

use std::marker::PhantomData;
use std::rc::Rc;

use solverforge_config::NetworkConfig;
use solverforge_core::{BoxedLifecycle, Result, Tuple, TupleLifecycle, TupleRef};

use super::{ensure_vacant, Node};
use crate::queue::{retract_carrier, PropagationQueue, Propagator, StaticPropagationQueue};

const NODE: &str = "MapNode";

/// Maps every input tuple to exactly one output tuple.
///
/// An update always re-maps the output in place and announces it, even when
/// the mapped facts compare equal: the input may have changed in a way the
/// output's equality cannot see.
pub struct MapNode<I, O, M> {
    mapper: M,
    store_index: usize,
    output_store_size: usize,
    queue: StaticPropagationQueue<O>,
    _phantom: PhantomData<fn(&I)>,
}

impl<I, O, M> MapNode<I, O, M>
where
    M: Fn(&I) -> O,
{
    pub fn new(
        mapper: M,
        store_index: usize,
        output_store_size: usize,
        consumer: BoxedLifecycle<O>,
    ) -> Self {
        Self {
            mapper,
            store_index,
            output_store_size,
            queue: StaticPropagationQueue::new(NODE, consumer),
            _phantom: PhantomData,
        }
    }
}

impl<I, O, M> TupleLifecycle<I> for MapNode<I, O, M>
where
    O: 'static,
    M: Fn(&I) -> O,
{
    fn insert(&mut self, tuple: &TupleRef<I>) -> Result<()> {
        ensure_vacant(tuple, self.store_index, NODE)?;
        let out = Tuple::new((self.mapper)(&*tuple.facts()), self.output_store_size);
        tuple.set_store(self.store_index, Rc::clone(&out))?;
        self.queue.insert(out)
    }

    fn update(&mut self, tuple: &TupleRef<I>) -> Result<()> {
        let Some(out) = tuple.get_store::<TupleRef<O>>(self.store_index)? else {
            return self.insert(tuple);
        };
        out.set_facts((self.mapper)(&*tuple.facts()));
        self.queue.update(out)
    }

    fn retract(&mut self, tuple: &TupleRef<I>) -> Result<()> {
        match tuple.remove_store::<TupleRef<O>>(self.store_index)? {
            Some(out) => retract_carrier(&mut self.queue, out, NODE),
            None => Ok(()),
        }
    }
}

impl<I, O, M> Propagator for MapNode<I, O, M> {
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

impl<I, O, M> Node for MapNode<I, O, M> {
    fn name(&self) -> &'static str {
        NODE
    }

    fn configure(&mut self, config: &NetworkConfig) -> Result<()> {
        self.queue.reserve(config.queue_capacity);
        Ok(())
    }
}
