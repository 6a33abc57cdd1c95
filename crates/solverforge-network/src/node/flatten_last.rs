//! Flatten-last node.

use std::rc::Rc;

use smallvec::SmallVec;
use solverforge_config::NetworkConfig;
use solverforge_core::{BoxedLifecycle, Result, Tuple, TupleLifecycle, TupleRef};

use super::{ensure_vacant, Node};
use crate::identify::Identify;
use crate::queue::{retract_carrier, PropagationQueue, Propagator, StaticPropagationQueue};

const NODE: &str = "FlattenLastNode";

type Flattened<Item, O> = Vec<(Item, TupleRef<O>)>;

/// Expands the last fact of each input tuple into one output per item.
///
/// The input's slot keeps every item next to the output it produced. On
/// update the fresh item list is reconciled against that list by
/// [`Identify::same`]: a surviving item re-maps its output in place, a
/// vanished item retracts its output and a new item inserts one.
pub struct FlattenLastNode<I, Item, O, Fl, As> {
    flatten: Fl,
    assemble: As,
    store_index: usize,
    output_store_size: usize,
    queue: StaticPropagationQueue<O>,
    _phantom: std::marker::PhantomData<fn(&I) -> Item>,
}

impl<I, Item, O, Fl, As> FlattenLastNode<I, Item, O, Fl, As>
where
    Item: Identify + 'static,
    O: 'static,
    Fl: Fn(&I) -> Vec<Item>,
    As: Fn(&I, &Item) -> O,
{
    /// `flatten` lists the items of an input, `assemble` builds the output
    /// facts for one of them.
    pub fn new(
        flatten: Fl,
        assemble: As,
        store_index: usize,
        output_store_size: usize,
        consumer: BoxedLifecycle<O>,
    ) -> Self {
        Self {
            flatten,
            assemble,
            store_index,
            output_store_size,
            queue: StaticPropagationQueue::new(NODE, consumer),
            _phantom: std::marker::PhantomData,
        }
    }

    fn emit(&mut self, facts: &I, item: &Item) -> Result<TupleRef<O>> {
        let out = Tuple::new((self.assemble)(facts, item), self.output_store_size);
        self.queue.insert(Rc::clone(&out))?;
        Ok(out)
    }
}

impl<I, Item, O, Fl, As> TupleLifecycle<I> for FlattenLastNode<I, Item, O, Fl, As>
where
    Item: Identify + 'static,
    O: 'static,
    Fl: Fn(&I) -> Vec<Item>,
    As: Fn(&I, &Item) -> O,
{
    fn insert(&mut self, tuple: &TupleRef<I>) -> Result<()> {
        ensure_vacant(tuple, self.store_index, NODE)?;
        let facts = tuple.facts();
        let items = (self.flatten)(&*facts);
        let mut flattened: Flattened<Item, O> = Vec::with_capacity(items.len());
        for item in items {
            let out = self.emit(&*facts, &item)?;
            flattened.push((item, out));
        }
        drop(facts);
        store_flattened(tuple, self.store_index, flattened)
    }

    fn update(&mut self, tuple: &TupleRef<I>) -> Result<()> {
        let Some(old) = tuple.remove_store::<Flattened<Item, O>>(self.store_index)? else {
            return self.insert(tuple);
        };
        let facts = tuple.facts();
        let fresh = (self.flatten)(&*facts);
        let mut outputs: SmallVec<[Option<TupleRef<O>>; 8]> = fresh.iter().map(|_| None).collect();

        for (item, out) in old {
            let survivor = fresh
                .iter()
                .enumerate()
                .position(|(i, candidate)| outputs[i].is_none() && candidate.same(&item));
            match survivor {
                Some(i) => {
                    out.set_facts((self.assemble)(&*facts, &fresh[i]));
                    self.queue.update(Rc::clone(&out))?;
                    outputs[i] = Some(out);
                }
                None => retract_carrier(&mut self.queue, out, NODE)?,
            }
        }

        let mut flattened: Flattened<Item, O> = Vec::with_capacity(fresh.len());
        for (item, out) in fresh.into_iter().zip(outputs) {
            let out = match out {
                Some(out) => out,
                None => self.emit(&*facts, &item)?,
            };
            flattened.push((item, out));
        }
        drop(facts);
        store_flattened(tuple, self.store_index, flattened)
    }

    fn retract(&mut self, tuple: &TupleRef<I>) -> Result<()> {
        let Some(old) = tuple.remove_store::<Flattened<Item, O>>(self.store_index)? else {
            return Ok(());
        };
        for (_, out) in old {
            retract_carrier(&mut self.queue, out, NODE)?;
        }
        Ok(())
    }
}

// An empty result leaves the slot vacant.
fn store_flattened<I, Item: 'static, O: 'static>(
    tuple: &TupleRef<I>,
    store_index: usize,
    flattened: Flattened<Item, O>,
) -> Result<()> {
    if flattened.is_empty() {
        return Ok(());
    }
    tuple.set_store(store_index, flattened)
}

impl<I, Item, O, Fl, As> Propagator for FlattenLastNode<I, Item, O, Fl, As> {
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

impl<I, Item, O, Fl, As> Node for FlattenLastNode<I, Item, O, Fl, As> {
    fn name(&self) -> &'static str {
        NODE
    }

    fn configure(&mut self, config: &NetworkConfig) -> Result<()> {
        self.queue.reserve(config.queue_capacity);
        Ok(())
    }
}
