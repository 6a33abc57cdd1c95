//! If-exists and if-not-exists nodes.
//!
//! A left tuple passes through unchanged while at least one matching right
//! tuple exists (`if_exists`) or while none does (`if_not_exists`). Each
//! left tuple gets an [`ExistsCounter`] of its matching right tuples. The
//! counter only reconsiders its left tuple when the count crosses zero;
//! going from one match to two, or back, propagates nothing.
//!
//! With a filtering predicate the count can no longer be read off the
//! index. Every accepted pair then gets a tracker, linked into a tracker
//! list of either side, so that a change on one side undoes exactly the
//! matches it was part of.

use std::cell::Cell;
use std::rc::Rc;

use solverforge_config::NetworkConfig;
use solverforge_core::{
    Arena, BoxedLifecycle, ElementAwareLists, EntryId, Handle, LeftTupleLifecycle, ListId, Result,
    RightTupleLifecycle, SolverForgeError, TupleRef, TupleState,
};

use super::{ensure_vacant, lost_slot, Node};
use crate::index::Indexer;
use crate::joiner::{CrossJoiner, Filtering, Joiner};
use crate::queue::{Carrier, DynamicPropagationQueue, PropagationQueue, Propagator};

const NODE: &str = "IfExistsNode";

/// Store slots an if-exists node owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfExistsStores {
    pub left: usize,
    pub right: usize,
}

/// Match count of one left tuple, and the carrier that announces it.
///
/// The counter has its own lifecycle state: the left tuple's state belongs
/// to the node upstream.
pub struct ExistsCounter<L> {
    left: TupleRef<L>,
    state: Cell<TupleState>,
    count: Cell<usize>,
    trackers: Cell<Option<ListId>>,
}

type CounterRef<L> = Rc<ExistsCounter<L>>;

impl<L> ExistsCounter<L> {
    fn new(left: TupleRef<L>) -> CounterRef<L> {
        Rc::new(Self {
            left,
            state: Cell::new(TupleState::Dead),
            count: Cell::new(0),
            trackers: Cell::new(None),
        })
    }

    pub fn left(&self) -> &TupleRef<L> {
        &self.left
    }

    /// Number of right tuples currently matching.
    pub fn count_right(&self) -> usize {
        self.count.get()
    }

    pub fn state(&self) -> TupleState {
        self.state.get()
    }
}

impl<L> Carrier<L> for CounterRef<L> {
    #[inline]
    fn state(&self) -> TupleState {
        self.state.get()
    }

    #[inline]
    fn set_state(&self, state: TupleState) {
        self.state.set(state);
    }

    #[inline]
    fn tuple(&self) -> TupleRef<L> {
        Rc::clone(&self.left)
    }

    #[inline]
    fn carrier_id(&self) -> usize {
        Rc::as_ptr(self) as *const () as usize
    }
}

#[derive(Clone)]
struct LeftSlot<K> {
    key: K,
    entry: EntryId,
}

#[derive(Clone)]
struct RightSlot<K> {
    key: K,
    entry: EntryId,
    trackers: Option<ListId>,
}

/// One accepted left/right pair under a filtering predicate.
struct FilteringTracker<L> {
    counter: CounterRef<L>,
    entries: Option<(EntryId, EntryId)>,
}

/// Gates left tuples on the existence of matching right tuples.
pub struct IfExistsNode<L, R, J: Joiner<L, R>> {
    should_exist: bool,
    joiner: J,
    filtering: Option<Filtering<L, R>>,
    left_index: Box<dyn Indexer<J::Key, CounterRef<L>>>,
    right_index: Box<dyn Indexer<J::Key, TupleRef<R>>>,
    tracker_lists: ElementAwareLists<Handle>,
    trackers: Arena<FilteringTracker<L>>,
    stores: IfExistsStores,
    queue: DynamicPropagationQueue<L, CounterRef<L>>,
}

/// If-exists without equi-join keys: every right tuple is a candidate.
pub type UnindexedIfExistsNode<L, R> = IfExistsNode<L, R, CrossJoiner>;

impl<L, R, J> IfExistsNode<L, R, J>
where
    L: 'static,
    R: 'static,
    J: Joiner<L, R>,
{
    fn new(
        should_exist: bool,
        joiner: J,
        stores: IfExistsStores,
        consumer: BoxedLifecycle<L>,
    ) -> Self {
        let left_index = joiner.left_indexer();
        let right_index = joiner.right_indexer();
        Self {
            should_exist,
            joiner,
            filtering: None,
            left_index,
            right_index,
            tracker_lists: ElementAwareLists::new(),
            trackers: Arena::new(),
            stores,
            queue: DynamicPropagationQueue::new(NODE, consumer),
        }
    }

    /// Passes left tuples that have at least one matching right tuple.
    pub fn if_exists(joiner: J, stores: IfExistsStores, consumer: BoxedLifecycle<L>) -> Self {
        Self::new(true, joiner, stores, consumer)
    }

    /// Passes left tuples that have no matching right tuple.
    pub fn if_not_exists(joiner: J, stores: IfExistsStores, consumer: BoxedLifecycle<L>) -> Self {
        Self::new(false, joiner, stores, consumer)
    }

    pub fn with_filtering(mut self, filtering: Filtering<L, R>) -> Self {
        self.filtering = Some(filtering);
        self
    }

    #[inline]
    pub fn should_exist(&self) -> bool {
        self.should_exist
    }

    /// Match count of a left tuple, `None` if the node doesn't hold it.
    pub fn count_right(&self, left: &TupleRef<L>) -> Result<Option<usize>> {
        let Some(slot) = left.get_store::<LeftSlot<J::Key>>(self.stores.left)? else {
            return Ok(None);
        };
        Ok(self.left_index.get(slot.entry).map(|counter| counter.count_right()))
    }

    /// Number of live filtering trackers.
    pub fn tracker_count(&self) -> usize {
        self.trackers.len()
    }

    fn accepts(&self, left: &L, right: &R) -> bool {
        self.filtering
            .as_ref()
            .map_or(true, |filtering| filtering.test(left, right))
    }

    fn exists(&self, counter: &ExistsCounter<L>) -> bool {
        (counter.count.get() > 0) == self.should_exist
    }

    // Counter transitions.

    fn init_counter_left(&mut self, counter: &CounterRef<L>) -> Result<()> {
        if self.exists(counter) {
            self.queue.insert(Rc::clone(counter))?;
        }
        Ok(())
    }

    fn update_unchanged_counter_left(&mut self, counter: &CounterRef<L>) -> Result<()> {
        // Downstream filters still need to see the new facts.
        if counter.state() == TupleState::Ok {
            self.queue.update(Rc::clone(counter))?;
        }
        Ok(())
    }

    fn update_counter_left(&mut self, counter: &CounterRef<L>) -> Result<()> {
        let state = counter.state();
        if self.exists(counter) {
            return match state {
                TupleState::Creating | TupleState::Updating => Ok(()),
                TupleState::Ok | TupleState::Dying => self.queue.update(Rc::clone(counter)),
                TupleState::Dead | TupleState::Aborting => self.queue.insert(Rc::clone(counter)),
            };
        }
        if !state.is_live() {
            return Ok(());
        }
        self.do_retract_counter(counter)
    }

    fn kill_counter_left(&mut self, counter: &CounterRef<L>) -> Result<()> {
        if self.exists(counter) {
            self.do_retract_counter(counter)?;
        }
        Ok(())
    }

    fn increment_counter_right(&mut self, counter: &CounterRef<L>) -> Result<()> {
        if counter.count.get() == 0 {
            if self.should_exist {
                self.do_insert_counter(counter)?;
            } else {
                self.do_retract_counter(counter)?;
            }
        }
        counter.count.set(counter.count.get() + 1);
        Ok(())
    }

    fn decrement_counter_right(&mut self, counter: &CounterRef<L>) -> Result<()> {
        let count = counter
            .count
            .get()
            .checked_sub(1)
            .ok_or_else(|| SolverForgeError::Internal(format!("{NODE} counted below zero")))?;
        counter.count.set(count);
        if count == 0 {
            if self.should_exist {
                self.do_retract_counter(counter)?;
            } else {
                self.do_insert_counter(counter)?;
            }
        }
        Ok(())
    }

    fn do_insert_counter(&mut self, counter: &CounterRef<L>) -> Result<()> {
        match counter.state() {
            TupleState::Dying => self.queue.update(Rc::clone(counter)),
            TupleState::Dead | TupleState::Aborting => self.queue.insert(Rc::clone(counter)),
            state => Err(SolverForgeError::impossible(NODE, state, "insert")),
        }
    }

    fn do_retract_counter(&mut self, counter: &CounterRef<L>) -> Result<()> {
        match counter.state() {
            TupleState::Creating => self.queue.retract(Rc::clone(counter), TupleState::Aborting),
            TupleState::Updating | TupleState::Ok => {
                self.queue.retract(Rc::clone(counter), TupleState::Dying)
            }
            state => Err(SolverForgeError::impossible(NODE, state, "retract")),
        }
    }

    // Filtering trackers.

    fn add_tracker(&mut self, counter: &CounterRef<L>, left_list: ListId, right_list: ListId) -> Result<()> {
        let handle = self.trackers.insert(FilteringTracker {
            counter: Rc::clone(counter),
            entries: None,
        });
        let left_entry = self.tracker_lists.add(left_list, handle)?;
        let right_entry = self.tracker_lists.add(right_list, handle)?;
        if let Some(tracker) = self.trackers.get_mut(handle) {
            tracker.entries = Some((left_entry, right_entry));
        }
        Ok(())
    }

    fn remove_tracker(&mut self, handle: Handle) -> Result<CounterRef<L>> {
        let tracker = self
            .trackers
            .remove(handle)
            .ok_or(SolverForgeError::StaleHandle)?;
        if let Some((left_entry, right_entry)) = tracker.entries {
            self.tracker_lists.remove(left_entry)?;
            self.tracker_lists.remove(right_entry)?;
        }
        Ok(tracker.counter)
    }

    /// Drops the trackers of a left tuple without touching its count.
    fn clear_left_trackers(&mut self, counter: &CounterRef<L>) -> Result<()> {
        if let Some(list) = counter.trackers.get() {
            for handle in self.tracker_lists.to_vec(list) {
                self.remove_tracker(handle)?;
            }
        }
        Ok(())
    }

    /// Drops the trackers of a right tuple, decrementing each counter.
    fn release_right_trackers(&mut self, list: ListId) -> Result<()> {
        for handle in self.tracker_lists.to_vec(list) {
            let counter = self.remove_tracker(handle)?;
            self.decrement_counter_right(&counter)?;
        }
        Ok(())
    }

    /// Counts the right tuples matching a fresh or re-keyed counter.
    fn count_for_left(&mut self, counter: &CounterRef<L>, key: &J::Key) -> Result<()> {
        if self.filtering.is_none() {
            counter.count.set(self.right_index.count_matches(key));
            return Ok(());
        }
        let left_list = match counter.trackers.get() {
            Some(list) => list,
            None => {
                let list = self.tracker_lists.new_list();
                counter.trackers.set(Some(list));
                list
            }
        };
        for right in self.right_index.matches(key) {
            self.track_from_left(counter, &right, left_list)?;
        }
        Ok(())
    }

    fn track_from_left(&mut self, counter: &CounterRef<L>, right: &TupleRef<R>, left_list: ListId) -> Result<()> {
        if !self.accepts(&*counter.left.facts(), &*right.facts()) {
            return Ok(());
        }
        counter.count.set(counter.count.get() + 1);
        let right_list = self
            .right_trackers(right)?
            .ok_or_else(|| lost_slot(NODE, "right tracker list"))?;
        self.add_tracker(counter, left_list, right_list)
    }

    fn track_from_right(&mut self, counter: &CounterRef<L>, right: &TupleRef<R>, right_list: ListId) -> Result<()> {
        // A left tuple on its way out upstream takes no new matches.
        if !counter.left.state().is_live() {
            return Ok(());
        }
        if !self.accepts(&*counter.left.facts(), &*right.facts()) {
            return Ok(());
        }
        self.increment_counter_right(counter)?;
        let left_list = counter
            .trackers
            .get()
            .ok_or_else(|| lost_slot(NODE, "left tracker list"))?;
        self.add_tracker(counter, left_list, right_list)
    }

    fn right_trackers(&self, right: &TupleRef<R>) -> Result<Option<ListId>> {
        Ok(right
            .get_store::<RightSlot<J::Key>>(self.stores.right)?
            .and_then(|slot| slot.trackers))
    }

    /// Adds a right tuple's matches to every counter under `key`.
    fn probe_right(&mut self, right: &TupleRef<R>, key: &J::Key, trackers: Option<ListId>) -> Result<()> {
        let counters = self.left_index.matches(key);
        match trackers {
            None => {
                for counter in &counters {
                    self.increment_counter_right(counter)?;
                }
            }
            Some(list) => {
                for counter in &counters {
                    self.track_from_right(counter, right, list)?;
                }
            }
        }
        Ok(())
    }

    /// Takes a right tuple's matches away from the counters under `key`.
    fn unprobe_right(&mut self, key: &J::Key, trackers: Option<ListId>) -> Result<()> {
        match trackers {
            None => {
                for counter in self.left_index.matches(key) {
                    self.decrement_counter_right(&counter)?;
                }
                Ok(())
            }
            Some(list) => self.release_right_trackers(list),
        }
    }
}

impl<L, R, J> LeftTupleLifecycle<L> for IfExistsNode<L, R, J>
where
    L: 'static,
    R: 'static,
    J: Joiner<L, R>,
{
    fn insert_left(&mut self, left: &TupleRef<L>) -> Result<()> {
        ensure_vacant(left, self.stores.left, NODE)?;
        let key = self.joiner.left_key(&*left.facts());
        let counter = ExistsCounter::new(Rc::clone(left));
        let entry = self.left_index.put(key.clone(), Rc::clone(&counter))?;
        left.set_store(
            self.stores.left,
            LeftSlot {
                key: key.clone(),
                entry,
            },
        )?;
        self.count_for_left(&counter, &key)?;
        self.init_counter_left(&counter)
    }

    fn update_left(&mut self, left: &TupleRef<L>) -> Result<()> {
        let Some(slot) = left.get_store::<LeftSlot<J::Key>>(self.stores.left)? else {
            return self.insert_left(left);
        };
        let counter = self
            .left_index
            .get(slot.entry)
            .cloned()
            .ok_or_else(|| lost_slot(NODE, "exists counter"))?;
        let key = self.joiner.left_key(&*left.facts());

        if key == slot.key {
            if self.filtering.is_none() {
                return self.update_unchanged_counter_left(&counter);
            }
            // The facts changed, so every pair is re-tested.
            self.clear_left_trackers(&counter)?;
            counter.count.set(0);
            self.count_for_left(&counter, &key)?;
            return self.update_counter_left(&counter);
        }

        self.left_index.remove(slot.entry)?;
        self.clear_left_trackers(&counter)?;
        counter.count.set(0);
        let entry = self.left_index.put(key.clone(), Rc::clone(&counter))?;
        left.set_store(
            self.stores.left,
            LeftSlot {
                key: key.clone(),
                entry,
            },
        )?;
        self.count_for_left(&counter, &key)?;
        self.update_counter_left(&counter)
    }

    fn retract_left(&mut self, left: &TupleRef<L>) -> Result<()> {
        let Some(slot) = left.remove_store::<LeftSlot<J::Key>>(self.stores.left)? else {
            return Ok(());
        };
        let counter = self.left_index.remove(slot.entry)?;
        self.clear_left_trackers(&counter)?;
        if let Some(list) = counter.trackers.take() {
            self.tracker_lists.remove_list(list)?;
        }
        self.kill_counter_left(&counter)
    }
}

impl<L, R, J> RightTupleLifecycle<R> for IfExistsNode<L, R, J>
where
    L: 'static,
    R: 'static,
    J: Joiner<L, R>,
{
    fn insert_right(&mut self, right: &TupleRef<R>) -> Result<()> {
        ensure_vacant(right, self.stores.right, NODE)?;
        let key = self.joiner.right_key(&*right.facts());
        let entry = self.right_index.put(key.clone(), Rc::clone(right))?;
        let trackers = self
            .filtering
            .is_some()
            .then(|| self.tracker_lists.new_list());
        right.set_store(
            self.stores.right,
            RightSlot {
                key: key.clone(),
                entry,
                trackers,
            },
        )?;
        self.probe_right(right, &key, trackers)
    }

    fn update_right(&mut self, right: &TupleRef<R>) -> Result<()> {
        let Some(slot) = right.get_store::<RightSlot<J::Key>>(self.stores.right)? else {
            return self.insert_right(right);
        };
        let key = self.joiner.right_key(&*right.facts());

        if key == slot.key {
            // Without filtering the facts of a right tuple don't matter.
            if let Some(list) = slot.trackers {
                self.release_right_trackers(list)?;
                self.probe_right(right, &key, slot.trackers)?;
            }
            return Ok(());
        }

        self.right_index.remove(slot.entry)?;
        self.unprobe_right(&slot.key, slot.trackers)?;
        let entry = self.right_index.put(key.clone(), Rc::clone(right))?;
        right.set_store(
            self.stores.right,
            RightSlot {
                key: key.clone(),
                entry,
                trackers: slot.trackers,
            },
        )?;
        self.probe_right(right, &key, slot.trackers)
    }

    fn retract_right(&mut self, right: &TupleRef<R>) -> Result<()> {
        let Some(slot) = right.remove_store::<RightSlot<J::Key>>(self.stores.right)? else {
            return Ok(());
        };
        self.right_index.remove(slot.entry)?;
        self.unprobe_right(&slot.key, slot.trackers)?;
        if let Some(list) = slot.trackers {
            self.tracker_lists.remove_list(list)?;
        }
        Ok(())
    }
}

impl<L, R, J: Joiner<L, R>> Propagator for IfExistsNode<L, R, J> {
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

impl<L, R, J: Joiner<L, R>> Node for IfExistsNode<L, R, J> {
    fn name(&self) -> &'static str {
        NODE
    }

    fn configure(&mut self, config: &NetworkConfig) -> Result<()> {
        self.queue.reserve(config.queue_capacity);
        Ok(())
    }
}
