//! Group node.
//!
//! Partitions its input by a key function and keeps one [`Group`] per key.
//! A group owns its output tuple and an accumulator, and counts the input
//! tuples contributing to it. The group leaves the key map the moment the
//! last contributor does.
//!
//! The collector's finisher runs at drain time, and only for groups whose
//! output is about to be announced. A tuple cannot exist without facts, so
//! a new group's output is first seeded from its empty accumulator; a group
//! that churns within a tick is finished for that seed alone.

use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;

use solverforge_config::{EnvironmentMode, NetworkConfig};
use solverforge_core::{
    BoxedLifecycle, Result, SolverForgeError, Tuple, TupleLifecycle, TupleRef, TupleState,
};
use tracing::trace;

use super::{ensure_vacant, lost_slot, Node};
use crate::collector::{Accumulator, UniCollector};
use crate::queue::{Carrier, DynamicPropagationQueue, PropagationQueue, Propagator};

const NODE: &str = "GroupNode";

/// Store slots a group node owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupStores {
    /// Slot on input tuples holding their group.
    pub group: usize,
    /// Slot on input tuples holding the value they contributed.
    pub undo: usize,
    /// Store size of output tuples.
    pub output_size: usize,
}

/// One partition of a group node's input.
pub struct Group<K, Acc, O> {
    key: K,
    initial_hash: Option<u64>,
    accumulator: RefCell<Acc>,
    tuple: TupleRef<O>,
    parent_count: Cell<usize>,
}

type GroupRef<K, Acc, O> = Rc<Group<K, Acc, O>>;

impl<K, Acc, O> Group<K, Acc, O> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The output tuple this group announces.
    pub fn tuple(&self) -> &TupleRef<O> {
        &self.tuple
    }

    /// Number of input tuples contributing to this group.
    pub fn parent_count(&self) -> usize {
        self.parent_count.get()
    }
}

impl<K, Acc, O> Carrier<O> for GroupRef<K, Acc, O> {
    #[inline]
    fn state(&self) -> TupleState {
        Rc::as_ref(&self.tuple).state()
    }

    #[inline]
    fn set_state(&self, state: TupleState) {
        Rc::as_ref(&self.tuple).set_state(state);
    }

    #[inline]
    fn tuple(&self) -> TupleRef<O> {
        Rc::clone(&self.tuple)
    }

    #[inline]
    fn carrier_id(&self) -> usize {
        Rc::as_ptr(self) as *const () as usize
    }
}

/// Collector of a group node that only groups.
pub struct NoCollector<A> {
    _phantom: PhantomData<fn(&A)>,
}

impl<A> Default for NoCollector<A> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<A> UniCollector<A> for NoCollector<A> {
    type Value = ();
    type Result = ();
    type Accumulator = NoAccumulator;

    #[inline]
    fn extract(&self, _entity: &A) {}

    fn create_accumulator(&self) -> NoAccumulator {
        NoAccumulator
    }
}

#[derive(Debug, Default)]
pub struct NoAccumulator;

impl Accumulator<(), ()> for NoAccumulator {
    #[inline]
    fn accumulate(&mut self, _: &()) {}

    #[inline]
    fn retract(&mut self, _: &()) {}

    #[inline]
    fn finish(&self) {}
}

fn hash_of<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Groups input tuples by key and announces one output tuple per group.
pub struct GroupNode<A, K, C: UniCollector<A>, O> {
    key_fn: Box<dyn Fn(&A) -> K>,
    collector: C,
    has_collector: bool,
    output: Box<dyn Fn(&K, C::Result) -> O>,
    groups: HashMap<K, GroupRef<K, C::Accumulator, O>>,
    stores: GroupStores,
    asserting: bool,
    queue: DynamicPropagationQueue<O, GroupRef<K, C::Accumulator, O>>,
}

impl<A, K, C> GroupNode<A, K, C, (K, C::Result)>
where
    A: 'static,
    K: Eq + Hash + Clone + Debug + 'static,
    C: UniCollector<A>,
    C::Value: 'static,
    C::Result: 'static,
    C::Accumulator: 'static,
{
    /// Groups by `key_fn` and announces `(key, result)` per group.
    pub fn keyed(
        key_fn: impl Fn(&A) -> K + 'static,
        collector: C,
        stores: GroupStores,
        consumer: BoxedLifecycle<(K, C::Result)>,
    ) -> Self {
        Self::build(
            Box::new(key_fn),
            collector,
            true,
            Box::new(|key: &K, result: C::Result| (key.clone(), result)),
            stores,
            consumer,
        )
    }
}

impl<A, K> GroupNode<A, K, NoCollector<A>, K>
where
    A: 'static,
    K: Eq + Hash + Clone + Debug + 'static,
{
    /// Groups by `key_fn` and announces each distinct key once.
    pub fn keyed_without_collector(
        key_fn: impl Fn(&A) -> K + 'static,
        stores: GroupStores,
        consumer: BoxedLifecycle<K>,
    ) -> Self {
        Self::build(
            Box::new(key_fn),
            NoCollector::default(),
            false,
            Box::new(|key: &K, _: ()| key.clone()),
            stores,
            consumer,
        )
    }
}

impl<A, C> GroupNode<A, (), C, C::Result>
where
    A: 'static,
    C: UniCollector<A>,
    C::Value: 'static,
    C::Result: 'static,
    C::Accumulator: 'static,
{
    /// Collects the whole input into a single group. The group exists only
    /// while the input is non-empty.
    pub fn singleton(collector: C, stores: GroupStores, consumer: BoxedLifecycle<C::Result>) -> Self {
        Self::build(
            Box::new(|_: &A| ()),
            collector,
            true,
            Box::new(|_: &(), result: C::Result| result),
            stores,
            consumer,
        )
    }
}

impl<A, K, C, O> GroupNode<A, K, C, O>
where
    A: 'static,
    K: Eq + Hash + Clone + Debug + 'static,
    C: UniCollector<A>,
    C::Value: 'static,
    C::Accumulator: 'static,
    O: 'static,
{
    fn build(
        key_fn: Box<dyn Fn(&A) -> K>,
        collector: C,
        has_collector: bool,
        output: Box<dyn Fn(&K, C::Result) -> O>,
        stores: GroupStores,
        consumer: BoxedLifecycle<O>,
    ) -> Self {
        Self {
            key_fn,
            collector,
            has_collector,
            output,
            groups: HashMap::new(),
            stores,
            asserting: false,
            queue: DynamicPropagationQueue::new(NODE, consumer),
        }
    }

    /// Checks group keys for hash changes when `mode` is asserted.
    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.asserting = mode.is_asserted();
        self
    }

    /// Number of live groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn contains_group(&self, key: &K) -> bool {
        self.groups.contains_key(key)
    }

    fn check_key(&self, group: &Group<K, C::Accumulator, O>) -> Result<()> {
        match group.initial_hash {
            Some(hash) if hash != hash_of(&group.key) => Err(SolverForgeError::GroupKeyChanged {
                key: format!("{:?}", group.key),
            }),
            _ => Ok(()),
        }
    }

    fn get_or_create_group(&mut self, key: K) -> Result<GroupRef<K, C::Accumulator, O>> {
        if let Some(group) = self.groups.get(&key) {
            group.parent_count.set(group.parent_count.get() + 1);
            return Ok(Rc::clone(group));
        }
        let accumulator = self.collector.create_accumulator();
        // Seed facts from the empty accumulator; the drain replaces them.
        let facts = (self.output)(&key, accumulator.finish());
        let group = Rc::new(Group {
            initial_hash: self.asserting.then(|| hash_of(&key)),
            key: key.clone(),
            accumulator: RefCell::new(accumulator),
            tuple: Tuple::new(facts, self.stores.output_size),
            parent_count: Cell::new(1),
        });
        self.queue.insert(Rc::clone(&group))?;
        self.groups.insert(key, Rc::clone(&group));
        trace!(event = "group_created", node = NODE, groups = self.groups.len());
        Ok(group)
    }

    fn accumulate(&self, tuple: &TupleRef<A>, group: &GroupRef<K, C::Accumulator, O>) -> Result<()> {
        if self.has_collector {
            let value = self.collector.extract(&*tuple.facts());
            group.accumulator.borrow_mut().accumulate(&value);
            tuple.set_store(self.stores.undo, value)?;
        }
        tuple.set_store(self.stores.group, Rc::clone(group))
    }

    fn undo(&self, tuple: &TupleRef<A>, group: &Group<K, C::Accumulator, O>) -> Result<()> {
        if self.has_collector {
            let value = tuple
                .remove_store::<C::Value>(self.stores.undo)?
                .ok_or_else(|| lost_slot(NODE, "undo value"))?;
            group.accumulator.borrow_mut().retract(&value);
        }
        Ok(())
    }

    fn create_tuple(&mut self, tuple: &TupleRef<A>, key: K) -> Result<()> {
        let group = self.get_or_create_group(key)?;
        self.accumulate(tuple, &group)?;
        match group.tuple.state() {
            TupleState::Creating | TupleState::Updating => Ok(()),
            TupleState::Ok | TupleState::Dying => self.queue.update(group),
            TupleState::Aborting => self.queue.insert(group),
            state => Err(SolverForgeError::impossible(NODE, state, "group insert")),
        }
    }

    /// Drops one contributor, retracting the group with its last one.
    fn kill_tuple(&mut self, group: GroupRef<K, C::Accumulator, O>) -> Result<()> {
        let parent_count = group
            .parent_count
            .get()
            .checked_sub(1)
            .ok_or_else(|| SolverForgeError::Internal(format!("{NODE} counted below zero")))?;
        group.parent_count.set(parent_count);
        let kill = parent_count == 0;
        if kill {
            self.check_key(&group)?;
            if self.groups.remove(&group.key).is_none() {
                return Err(SolverForgeError::MissingGroup {
                    key: format!("{:?}", group.key),
                });
            }
            trace!(event = "group_removed", node = NODE, groups = self.groups.len());
        }
        match group.tuple.state() {
            TupleState::Creating if kill => self.queue.retract(group, TupleState::Aborting),
            TupleState::Updating if kill => self.queue.retract(group, TupleState::Dying),
            TupleState::Creating | TupleState::Updating => Ok(()),
            TupleState::Ok if kill => self.queue.retract(group, TupleState::Dying),
            TupleState::Ok => self.queue.update(group),
            state => Err(SolverForgeError::impossible(NODE, state, "group retract")),
        }
    }
}

/// Re-computes a group's output facts right before they are announced.
fn apply_finisher<A, K, C, O>(
    output: &dyn Fn(&K, C::Result) -> O,
    group: &Group<K, C::Accumulator, O>,
) -> Result<()>
where
    C: UniCollector<A>,
{
    if matches!(
        Rc::as_ref(&group.tuple).state(),
        TupleState::Creating | TupleState::Updating
    ) {
        let result = group.accumulator.borrow().finish();
        group.tuple.set_facts(output(&group.key, result));
    }
    Ok(())
}

impl<A, K, C, O> TupleLifecycle<A> for GroupNode<A, K, C, O>
where
    A: 'static,
    K: Eq + Hash + Clone + Debug + 'static,
    C: UniCollector<A>,
    C::Value: 'static,
    C::Accumulator: 'static,
    O: 'static,
{
    fn insert(&mut self, tuple: &TupleRef<A>) -> Result<()> {
        ensure_vacant(tuple, self.stores.group, NODE)?;
        let key = (self.key_fn)(&*tuple.facts());
        self.create_tuple(tuple, key)
    }

    fn update(&mut self, tuple: &TupleRef<A>) -> Result<()> {
        let Some(group) = tuple.get_store::<GroupRef<K, C::Accumulator, O>>(self.stores.group)? else {
            return self.insert(tuple);
        };
        self.undo(tuple, &group)?;
        if self.asserting {
            self.check_key(&group)?;
        }
        let key = (self.key_fn)(&*tuple.facts());
        if key != group.key {
            self.kill_tuple(group)?;
            return self.create_tuple(tuple, key);
        }
        // Same group, same parent count.
        self.accumulate(tuple, &group)?;
        match group.tuple.state() {
            TupleState::Creating | TupleState::Updating => Ok(()),
            TupleState::Ok => self.queue.update(group),
            state => Err(SolverForgeError::impossible(NODE, state, "group update")),
        }
    }

    fn retract(&mut self, tuple: &TupleRef<A>) -> Result<()> {
        let Some(group) = tuple.remove_store::<GroupRef<K, C::Accumulator, O>>(self.stores.group)? else {
            return Ok(());
        };
        self.undo(tuple, &group)?;
        self.kill_tuple(group)
    }
}

impl<A, K, C, O> Propagator for GroupNode<A, K, C, O>
where
    C: UniCollector<A>,
{
    fn propagate_retracts(&mut self) -> Result<()> {
        self.queue.propagate_retracts()
    }

    fn propagate_updates(&mut self) -> Result<()> {
        if !self.has_collector {
            return self.queue.propagate_updates();
        }
        let output = &*self.output;
        self.queue
            .propagate_updates_with(&mut |group| apply_finisher::<A, K, C, O>(output, group))
    }

    fn propagate_inserts(&mut self) -> Result<()> {
        if !self.has_collector {
            return self.queue.propagate_inserts();
        }
        let output = &*self.output;
        self.queue
            .propagate_inserts_with(&mut |group| apply_finisher::<A, K, C, O>(output, group))
    }

    fn pending(&self) -> usize {
        self.queue.pending()
    }
}

impl<A, K, C, O> Node for GroupNode<A, K, C, O>
where
    C: UniCollector<A>,
{
    fn name(&self) -> &'static str {
        NODE
    }

    fn configure(&mut self, config: &NetworkConfig) -> Result<()> {
        let asserting = config.environment_mode.is_asserted();
        if asserting != self.asserting && !self.groups.is_empty() {
            return Err(SolverForgeError::Config(format!(
                "{NODE} cannot change its environment mode once groups exist"
            )));
        }
        self.asserting = asserting;
        self.queue.reserve(config.queue_capacity);
        Ok(())
    }
}
