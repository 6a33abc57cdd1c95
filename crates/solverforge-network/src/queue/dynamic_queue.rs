//! Queue with a single dirty list and in-place re-classification.

use std::collections::HashMap;
use std::marker::PhantomData;

use solverforge_core::{BoxedLifecycle, Result, SolverForgeError, TupleState};
use tracing::trace;

use super::{Carrier, PropagationQueue, Propagator};

/// Files every carrier once into a dirty list and marks it as a pending
/// insert, a pending retract, or neither (a pending update).
///
/// A carrier can change its mind any number of times before the queue is
/// drained: re-filing only flips its bits. The queue keeps the carrier's
/// position itself, so carriers carry no queue-internal state.
pub struct DynamicPropagationQueue<F, C> {
    node: &'static str,
    dirty: Vec<C>,
    positions: HashMap<usize, usize>,
    insert_bits: BitSet,
    retract_bits: BitSet,
    consumer: BoxedLifecycle<F>,
    _phantom: PhantomData<fn(&F)>,
}

impl<F, C: Carrier<F>> DynamicPropagationQueue<F, C> {
    pub fn new(node: &'static str, consumer: BoxedLifecycle<F>) -> Self {
        Self::with_capacity(node, consumer, 0)
    }

    pub fn with_capacity(node: &'static str, consumer: BoxedLifecycle<F>, capacity: usize) -> Self {
        Self {
            node,
            dirty: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            insert_bits: BitSet::default(),
            retract_bits: BitSet::default(),
            consumer,
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn node(&self) -> &'static str {
        self.node
    }

    /// Reserves room for `additional` dirty carriers.
    pub fn reserve(&mut self, additional: usize) {
        self.dirty.reserve(additional);
        self.positions.reserve(additional);
    }

    /// Returns true if the carrier is waiting in this queue.
    #[inline]
    pub fn contains(&self, carrier: &C) -> bool {
        self.positions.contains_key(&carrier.carrier_id())
    }

    fn position(&self, carrier: &C) -> Option<usize> {
        self.positions.get(&carrier.carrier_id()).copied()
    }

    fn push(&mut self, carrier: C) -> usize {
        let position = self.dirty.len();
        self.positions.insert(carrier.carrier_id(), position);
        self.dirty.push(carrier);
        position
    }

    /// Propagates pending updates, calling `preprocess` on each carrier
    /// right before it is announced.
    pub fn propagate_updates_with(
        &mut self,
        preprocess: &mut dyn FnMut(&C) -> Result<()>,
    ) -> Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        let mut count = 0usize;
        for position in 0..self.dirty.len() {
            if self.insert_bits.get(position) {
                continue;
            }
            let carrier = &self.dirty[position];
            match carrier.state() {
                // Retracted in this tick.
                TupleState::Dead => continue,
                TupleState::Updating => {
                    preprocess(carrier)?;
                    self.consumer.update(&carrier.tuple())?;
                    carrier.transition(TupleState::Ok);
                    count += 1;
                }
                state => {
                    return Err(SolverForgeError::impossible(
                        self.node,
                        state,
                        "update propagation",
                    ))
                }
            }
        }
        if count > 0 {
            trace!(event = "propagate", node = self.node, phase = "update", count);
        }
        Ok(())
    }

    /// Propagates pending inserts, calling `preprocess` on each carrier
    /// right before it is announced, then empties the queue.
    pub fn propagate_inserts_with(
        &mut self,
        preprocess: &mut dyn FnMut(&C) -> Result<()>,
    ) -> Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        let mut count = 0usize;
        for position in self.insert_bits.ones() {
            let carrier = &self.dirty[position];
            match carrier.state() {
                TupleState::Creating => {
                    preprocess(carrier)?;
                    self.consumer.insert(&carrier.tuple())?;
                    carrier.transition(TupleState::Ok);
                    count += 1;
                }
                state => {
                    return Err(SolverForgeError::impossible(
                        self.node,
                        state,
                        "insert propagation",
                    ))
                }
            }
        }
        if count > 0 {
            trace!(event = "propagate", node = self.node, phase = "insert", count);
        }
        self.dirty.clear();
        self.positions.clear();
        self.insert_bits.clear();
        self.retract_bits.clear();
        Ok(())
    }
}

impl<F, C: Carrier<F>> PropagationQueue<C> for DynamicPropagationQueue<F, C> {
    fn insert(&mut self, carrier: C) -> Result<()> {
        match (carrier.state(), self.position(&carrier)) {
            (TupleState::Dead, None) => {
                carrier.transition(TupleState::Creating);
                let position = self.push(carrier);
                self.insert_bits.set(position);
                Ok(())
            }
            // Retracted and revived before it was ever announced.
            (TupleState::Aborting, Some(position)) => {
                carrier.transition(TupleState::Creating);
                self.retract_bits.unset(position);
                self.insert_bits.set(position);
                Ok(())
            }
            (TupleState::Creating, _) => Err(SolverForgeError::DuplicateInsert { node: self.node }),
            (state, _) => Err(SolverForgeError::impossible(self.node, state, "insert")),
        }
    }

    fn update(&mut self, carrier: C) -> Result<()> {
        match (carrier.state(), self.position(&carrier)) {
            (TupleState::Ok, None) => {
                carrier.transition(TupleState::Updating);
                self.push(carrier);
                Ok(())
            }
            // Dying and revived in the same tick: announce as an update.
            (TupleState::Dying, Some(position)) => {
                carrier.transition(TupleState::Updating);
                self.retract_bits.unset(position);
                Ok(())
            }
            (TupleState::Creating | TupleState::Updating, Some(_)) => Ok(()),
            (state, _) => Err(SolverForgeError::impossible(self.node, state, "update")),
        }
    }

    fn retract(&mut self, carrier: C, state: TupleState) -> Result<()> {
        let current = carrier.state();
        if current == state {
            return Ok(());
        }
        match (current, state, self.position(&carrier)) {
            (TupleState::Creating, TupleState::Aborting, Some(position)) => {
                carrier.transition(state);
                self.insert_bits.unset(position);
                self.retract_bits.set(position);
                Ok(())
            }
            (TupleState::Updating, TupleState::Dying, Some(position)) => {
                carrier.transition(state);
                self.retract_bits.set(position);
                Ok(())
            }
            (TupleState::Ok, TupleState::Dying, None) => {
                carrier.transition(state);
                let position = self.push(carrier);
                self.retract_bits.set(position);
                Ok(())
            }
            _ => Err(SolverForgeError::impossible(self.node, current, "retract")),
        }
    }
}

impl<F, C: Carrier<F>> Propagator for DynamicPropagationQueue<F, C> {
    fn propagate_retracts(&mut self) -> Result<()> {
        let mut count = 0usize;
        for position in self.retract_bits.ones() {
            let carrier = &self.dirty[position];
            match carrier.state() {
                TupleState::Dying => {
                    self.consumer.retract(&carrier.tuple())?;
                    carrier.transition(TupleState::Dead);
                    count += 1;
                }
                TupleState::Aborting => carrier.transition(TupleState::Dead),
                state => {
                    return Err(SolverForgeError::impossible(
                        self.node,
                        state,
                        "retract propagation",
                    ))
                }
            }
        }
        if count > 0 {
            trace!(event = "propagate", node = self.node, phase = "retract", count);
        }
        Ok(())
    }

    fn propagate_updates(&mut self) -> Result<()> {
        self.propagate_updates_with(&mut |_| Ok(()))
    }

    fn propagate_inserts(&mut self) -> Result<()> {
        self.propagate_inserts_with(&mut |_| Ok(()))
    }

    fn pending(&self) -> usize {
        self.dirty.len()
    }
}

impl<F, C> std::fmt::Debug for DynamicPropagationQueue<F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicPropagationQueue")
            .field("node", &self.node)
            .field("dirty", &self.dirty.len())
            .finish()
    }
}

/// Growable bit set over dirty-list positions.
#[derive(Debug, Default)]
struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    fn set(&mut self, bit: usize) {
        let word = bit / 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (bit % 64);
    }

    fn unset(&mut self, bit: usize) {
        if let Some(word) = self.words.get_mut(bit / 64) {
            *word &= !(1u64 << (bit % 64));
        }
    }

    fn get(&self, bit: usize) -> bool {
        self.words
            .get(bit / 64)
            .is_some_and(|word| word & (1u64 << (bit % 64)) != 0)
    }

    fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    /// Snapshot of the set bits in ascending order.
    fn ones(&self) -> Vec<usize> {
        let mut ones = Vec::new();
        for (index, &word) in self.words.iter().enumerate() {
            let mut rest = word;
            while rest != 0 {
                let bit = rest.trailing_zeros() as usize;
                ones.push(index * 64 + bit);
                rest &= rest - 1;
            }
        }
        ones
    }
}
