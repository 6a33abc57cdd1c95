//! Join node, indexed and unindexed.
//!
//! One output tuple exists for every left/right pair the joiner matches and
//! the optional filtering accepts. Each input tuple owns a backpointer list
//! of its outputs in `out_lists`; each output records its entry in both of
//! its parents' lists, so that retracting either parent removes the output
//! from both lists in O(1).

use std::collections::HashMap;
use std::rc::Rc;

use solverforge_config::NetworkConfig;
use solverforge_core::{
    BoxedLifecycle, ElementAwareLists, EntryId, LeftTupleLifecycle, ListId, Result,
    RightTupleLifecycle, Tuple, TupleRef,
};

use super::{ensure_vacant, lost_slot, Node};
use crate::index::Indexer;
use crate::joined::Joined;
use crate::joiner::{CrossJoiner, Filtering, Joiner};
use crate::queue::{retract_carrier, PropagationQueue, Propagator, StaticPropagationQueue};

const NODE: &str = "JoinNode";

/// Store slots a join node owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinStores {
    /// Slot on left input tuples.
    pub left: usize,
    /// Slot on right input tuples.
    pub right: usize,
    /// Slot on the join's own output tuples.
    pub output: usize,
    /// Store size of output tuples, including `output` and every slot the
    /// consumers downstream were assigned.
    pub output_size: usize,
}

#[derive(Clone)]
struct InputSlot<K> {
    key: K,
    entry: EntryId,
    out_list: ListId,
}

#[derive(Clone, Copy)]
struct OutputSlot {
    left_entry: EntryId,
    right_entry: EntryId,
}

/// Maintains one output per matching left/right pair.
///
/// Candidate pairs come from the joiner's indexers. A key change on one
/// side retracts every output of that tuple and re-probes; a fact change
/// that keeps the key re-maps the outputs in place. With a filtering
/// predicate, a fact change re-tests every candidate partner instead.
pub struct JoinNode<L, R, O, J: Joiner<L, R>> {
    joiner: J,
    filtering: Option<Filtering<L, R>>,
    left_index: Box<dyn Indexer<J::Key, TupleRef<L>>>,
    right_index: Box<dyn Indexer<J::Key, TupleRef<R>>>,
    out_lists: ElementAwareLists<TupleRef<O>>,
    stores: JoinStores,
    queue: StaticPropagationQueue<O>,
}

/// Join without equi-join keys: every left meets every right.
pub type UnindexedJoinNode<L, R, O> = JoinNode<L, R, O, CrossJoiner>;

impl<L, R, O, J> JoinNode<L, R, O, J>
where
    L: 'static,
    R: 'static,
    O: Joined<L, R> + 'static,
    J: Joiner<L, R>,
{
    pub fn new(joiner: J, stores: JoinStores, consumer: BoxedLifecycle<O>) -> Self {
        let left_index = joiner.left_indexer();
        let right_index = joiner.right_indexer();
        Self {
            joiner,
            filtering: None,
            left_index,
            right_index,
            out_lists: ElementAwareLists::new(),
            stores,
            queue: StaticPropagationQueue::new(NODE, consumer),
        }
    }

    /// Adds a residual predicate tested on every candidate pair.
    pub fn with_filtering(mut self, filtering: Filtering<L, R>) -> Self {
        self.filtering = Some(filtering);
        self
    }

    /// Number of outputs currently held, retracted ones excluded.
    pub fn output_count(&self) -> usize {
        // Every output sits in exactly two lists.
        self.out_lists.entry_count() / 2
    }

    /// Number of outputs the given left tuple participates in.
    pub fn left_output_count(&self, left: &TupleRef<L>) -> Result<usize> {
        let slot = left.get_store::<InputSlot<J::Key>>(self.stores.left)?;
        Ok(slot.map_or(0, |slot| self.out_lists.len(slot.out_list)))
    }

    /// Number of outputs the given right tuple participates in.
    pub fn right_output_count(&self, right: &TupleRef<R>) -> Result<usize> {
        let slot = right.get_store::<InputSlot<J::Key>>(self.stores.right)?;
        Ok(slot.map_or(0, |slot| self.out_lists.len(slot.out_list)))
    }

    fn accepts(&self, left: &L, right: &R) -> bool {
        self.filtering
            .as_ref()
            .map_or(true, |filtering| filtering.test(left, right))
    }

    fn left_slot(&self, left: &TupleRef<L>) -> Result<InputSlot<J::Key>> {
        left.get_store(self.stores.left)?
            .ok_or_else(|| lost_slot(NODE, "left input slot"))
    }

    fn right_slot(&self, right: &TupleRef<R>) -> Result<InputSlot<J::Key>> {
        right
            .get_store(self.stores.right)?
            .ok_or_else(|| lost_slot(NODE, "right input slot"))
    }

    /// Creates the output for a pair the caller already matched.
    fn insert_output(
        &mut self,
        left: &TupleRef<L>,
        right: &TupleRef<R>,
        left_list: ListId,
        right_list: ListId,
    ) -> Result<()> {
        let facts = O::join(&*left.facts(), &*right.facts());
        let out = Tuple::new(facts, self.stores.output_size);
        let left_entry = self.out_lists.add(left_list, Rc::clone(&out))?;
        let right_entry = self.out_lists.add(right_list, Rc::clone(&out))?;
        out.set_store(
            self.stores.output,
            OutputSlot {
                left_entry,
                right_entry,
            },
        )?;
        self.queue.insert(out)
    }

    /// Unlinks the output from both parents and schedules its retraction.
    fn retract_output(&mut self, out: TupleRef<O>) -> Result<()> {
        let slot = out
            .remove_store::<OutputSlot>(self.stores.output)?
            .ok_or_else(|| lost_slot(NODE, "output slot"))?;
        self.out_lists.remove(slot.left_entry)?;
        self.out_lists.remove(slot.right_entry)?;
        retract_carrier(&mut self.queue, out, NODE)
    }

    fn retract_outputs(&mut self, list: ListId) -> Result<()> {
        for out in self.out_lists.to_vec(list) {
            self.retract_output(out)?;
        }
        Ok(())
    }

    /// Maps each output of `list` to the backpointer list of its partner on
    /// the other side. `partner_entry` picks that partner's entry.
    fn outputs_by_partner(
        &self,
        list: ListId,
        partner_entry: fn(&OutputSlot) -> EntryId,
    ) -> Result<HashMap<ListId, TupleRef<O>>> {
        let mut by_partner = HashMap::with_capacity(self.out_lists.len(list));
        for out in self.out_lists.iter(list) {
            let slot = out
                .get_store::<OutputSlot>(self.stores.output)?
                .ok_or_else(|| lost_slot(NODE, "output slot"))?;
            let partner = self.out_lists.list_of(partner_entry(&slot))?;
            by_partner.insert(partner, Rc::clone(out));
        }
        Ok(by_partner)
    }

    fn probe_left(&mut self, left: &TupleRef<L>, key: &J::Key, left_list: ListId) -> Result<()> {
        for right in self.right_index.matches(key) {
            if !self.accepts(&*left.facts(), &*right.facts()) {
                continue;
            }
            let right_list = self.right_slot(&right)?.out_list;
            self.insert_output(left, &right, left_list, right_list)?;
        }
        Ok(())
    }

    fn probe_right(&mut self, right: &TupleRef<R>, key: &J::Key, right_list: ListId) -> Result<()> {
        for left in self.left_index.matches(key) {
            if !self.accepts(&*left.facts(), &*right.facts()) {
                continue;
            }
            let left_list = self.left_slot(&left)?.out_list;
            self.insert_output(&left, right, left_list, right_list)?;
        }
        Ok(())
    }

    fn refilter_left(&mut self, left: &TupleRef<L>, slot: &InputSlot<J::Key>) -> Result<()> {
        let mut existing = self.outputs_by_partner(slot.out_list, |s| s.right_entry)?;
        for right in self.right_index.matches(&slot.key) {
            let right_list = self.right_slot(&right)?.out_list;
            let accepted = self.accepts(&*left.facts(), &*right.facts());
            match (existing.remove(&right_list), accepted) {
                (Some(out), true) => {
                    out.update_facts(|facts| facts.set_left(&*left.facts()));
                    self.queue.update(out)?;
                }
                (Some(out), false) => self.retract_output(out)?,
                (None, true) => self.insert_output(left, &right, slot.out_list, right_list)?,
                (None, false) => {}
            }
        }
        // Partners no longer in the index.
        for (_, out) in existing {
            self.retract_output(out)?;
        }
        Ok(())
    }

    fn refilter_right(&mut self, right: &TupleRef<R>, slot: &InputSlot<J::Key>) -> Result<()> {
        let mut existing = self.outputs_by_partner(slot.out_list, |s| s.left_entry)?;
        for left in self.left_index.matches(&slot.key) {
            let left_list = self.left_slot(&left)?.out_list;
            let accepted = self.accepts(&*left.facts(), &*right.facts());
            match (existing.remove(&left_list), accepted) {
                (Some(out), true) => {
                    out.update_facts(|facts| facts.set_right(&*right.facts()));
                    self.queue.update(out)?;
                }
                (Some(out), false) => self.retract_output(out)?,
                (None, true) => self.insert_output(&left, right, left_list, slot.out_list)?,
                (None, false) => {}
            }
        }
        for (_, out) in existing {
            self.retract_output(out)?;
        }
        Ok(())
    }
}

impl<L, R, O, J> LeftTupleLifecycle<L> for JoinNode<L, R, O, J>
where
    L: 'static,
    R: 'static,
    O: Joined<L, R> + 'static,
    J: Joiner<L, R>,
{
    fn insert_left(&mut self, left: &TupleRef<L>) -> Result<()> {
        ensure_vacant(left, self.stores.left, NODE)?;
        let key = self.joiner.left_key(&*left.facts());
        let out_list = self.out_lists.new_list();
        let entry = self.left_index.put(key.clone(), Rc::clone(left))?;
        left.set_store(
            self.stores.left,
            InputSlot {
                key: key.clone(),
                entry,
                out_list,
            },
        )?;
        self.probe_left(left, &key, out_list)
    }

    fn update_left(&mut self, left: &TupleRef<L>) -> Result<()> {
        let Some(slot) = left.get_store::<InputSlot<J::Key>>(self.stores.left)? else {
            return self.insert_left(left);
        };
        let key = self.joiner.left_key(&*left.facts());
        if key != slot.key {
            self.left_index.remove(slot.entry)?;
            self.retract_outputs(slot.out_list)?;
            let entry = self.left_index.put(key.clone(), Rc::clone(left))?;
            left.set_store(
                self.stores.left,
                InputSlot {
                    key: key.clone(),
                    entry,
                    out_list: slot.out_list,
                },
            )?;
            return self.probe_left(left, &key, slot.out_list);
        }
        if self.filtering.is_some() {
            return self.refilter_left(left, &slot);
        }
        for out in self.out_lists.to_vec(slot.out_list) {
            out.update_facts(|facts| facts.set_left(&*left.facts()));
            self.queue.update(out)?;
        }
        Ok(())
    }

    fn retract_left(&mut self, left: &TupleRef<L>) -> Result<()> {
        // Never inserted, or inserted and retracted already.
        let Some(slot) = left.remove_store::<InputSlot<J::Key>>(self.stores.left)? else {
            return Ok(());
        };
        self.left_index.remove(slot.entry)?;
        self.retract_outputs(slot.out_list)?;
        self.out_lists.remove_list(slot.out_list)?;
        Ok(())
    }
}

impl<L, R, O, J> RightTupleLifecycle<R> for JoinNode<L, R, O, J>
where
    L: 'static,
    R: 'static,
    O: Joined<L, R> + 'static,
    J: Joiner<L, R>,
{
    fn insert_right(&mut self, right: &TupleRef<R>) -> Result<()> {
        ensure_vacant(right, self.stores.right, NODE)?;
        let key = self.joiner.right_key(&*right.facts());
        let out_list = self.out_lists.new_list();
        let entry = self.right_index.put(key.clone(), Rc::clone(right))?;
        right.set_store(
            self.stores.right,
            InputSlot {
                key: key.clone(),
                entry,
                out_list,
            },
        )?;
        self.probe_right(right, &key, out_list)
    }

    fn update_right(&mut self, right: &TupleRef<R>) -> Result<()> {
        let Some(slot) = right.get_store::<InputSlot<J::Key>>(self.stores.right)? else {
            return self.insert_right(right);
        };
        let key = self.joiner.right_key(&*right.facts());
        if key != slot.key {
            self.right_index.remove(slot.entry)?;
            self.retract_outputs(slot.out_list)?;
            let entry = self.right_index.put(key.clone(), Rc::clone(right))?;
            right.set_store(
                self.stores.right,
                InputSlot {
                    key: key.clone(),
                    entry,
                    out_list: slot.out_list,
                },
            )?;
            return self.probe_right(right, &key, slot.out_list);
        }
        if self.filtering.is_some() {
            return self.refilter_right(right, &slot);
        }
        for out in self.out_lists.to_vec(slot.out_list) {
            out.update_facts(|facts| facts.set_right(&*right.facts()));
            self.queue.update(out)?;
        }
        Ok(())
    }

    fn retract_right(&mut self, right: &TupleRef<R>) -> Result<()> {
        let Some(slot) = right.remove_store::<InputSlot<J::Key>>(self.stores.right)? else {
            return Ok(());
        };
        self.right_index.remove(slot.entry)?;
        self.retract_outputs(slot.out_list)?;
        self.out_lists.remove_list(slot.out_list)?;
        Ok(())
    }
}

impl<L, R, O, J: Joiner<L, R>> Propagator for JoinNode<L, R, O, J> {
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

impl<L, R, O, J: Joiner<L, R>> Node for JoinNode<L, R, O, J> {
    fn name(&self) -> &'static str {
        NODE
    }

    fn configure(&mut self, config: &NetworkConfig) -> Result<()> {
        self.queue.reserve(config.queue_capacity);
        Ok(())
    }
}
