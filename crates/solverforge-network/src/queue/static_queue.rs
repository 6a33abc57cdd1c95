//! Queue with three fixed sub-queues.

use std::mem;

use solverforge_core::{BoxedLifecycle, Result, SolverForgeError, TupleRef, TupleState};
use tracing::trace;

use super::{Carrier, PropagationQueue, Propagator};

/// Files each tuple into the retract, update or insert sub-queue the moment
/// it is reported.
///
/// A tuple never moves between sub-queues. When a tuple that is waiting to
/// be inserted or updated gets retracted in the same tick, the retract phase
/// leaves it `Dead` and the later phase skips it.
pub struct StaticPropagationQueue<F> {
    node: &'static str,
    retract_queue: Vec<TupleRef<F>>,
    update_queue: Vec<TupleRef<F>>,
    insert_queue: Vec<TupleRef<F>>,
    consumer: BoxedLifecycle<F>,
}

impl<F> StaticPropagationQueue<F> {
    /// Creates a queue forwarding to `consumer`. `node` names the owning
    /// node in errors and logs.
    pub fn new(node: &'static str, consumer: BoxedLifecycle<F>) -> Self {
        Self::with_capacity(node, consumer, 0)
    }

    pub fn with_capacity(node: &'static str, consumer: BoxedLifecycle<F>, capacity: usize) -> Self {
        Self {
            node,
            retract_queue: Vec::with_capacity(capacity),
            update_queue: Vec::with_capacity(capacity),
            insert_queue: Vec::with_capacity(capacity),
            consumer,
        }
    }

    #[inline]
    pub fn node(&self) -> &'static str {
        self.node
    }

    /// Reserves room for `additional` carriers in every sub-queue.
    pub fn reserve(&mut self, additional: usize) {
        self.retract_queue.reserve(additional);
        self.update_queue.reserve(additional);
        self.insert_queue.reserve(additional);
    }
}

impl<F> PropagationQueue<TupleRef<F>> for StaticPropagationQueue<F> {
    fn insert(&mut self, tuple: TupleRef<F>) -> Result<()> {
        match tuple.state() {
            TupleState::Dead => {
                tuple.transition(TupleState::Creating);
                self.insert_queue.push(tuple);
                Ok(())
            }
            TupleState::Creating => Err(SolverForgeError::DuplicateInsert { node: self.node }),
            state => Err(SolverForgeError::impossible(self.node, state, "insert")),
        }
    }

    fn update(&mut self, tuple: TupleRef<F>) -> Result<()> {
        match tuple.state() {
            TupleState::Ok => {
                tuple.transition(TupleState::Updating);
                self.update_queue.push(tuple);
                Ok(())
            }
            // Already queued; it will be announced with its latest facts.
            TupleState::Creating | TupleState::Updating => Ok(()),
            state => Err(SolverForgeError::impossible(self.node, state, "update")),
        }
    }

    fn retract(&mut self, tuple: TupleRef<F>, state: TupleState) -> Result<()> {
        let current = tuple.state();
        if current == state {
            return Ok(());
        }
        match (current, state) {
            (TupleState::Creating, TupleState::Aborting)
            | (TupleState::Updating | TupleState::Ok, TupleState::Dying) => {
                tuple.transition(state);
                self.retract_queue.push(tuple);
                Ok(())
            }
            _ => Err(SolverForgeError::impossible(self.node, current, "retract")),
        }
    }
}

impl<F> Propagator for StaticPropagationQueue<F> {
    fn propagate_retracts(&mut self) -> Result<()> {
        if self.retract_queue.is_empty() {
            return Ok(());
        }
        let queue = mem::take(&mut self.retract_queue);
        trace!(
            event = "propagate",
            node = self.node,
            phase = "retract",
            count = queue.len(),
        );
        for tuple in &queue {
            match tuple.state() {
                TupleState::Dying => {
                    self.consumer.retract(tuple)?;
                    tuple.transition(TupleState::Dead);
                }
                TupleState::Aborting => tuple.transition(TupleState::Dead),
                state => {
                    return Err(SolverForgeError::impossible(
                        self.node,
                        state,
                        "retract propagation",
                    ))
                }
            }
        }
        self.retract_queue = reuse(queue);
        Ok(())
    }

    fn propagate_updates(&mut self) -> Result<()> {
        if self.update_queue.is_empty() {
            return Ok(());
        }
        let queue = mem::take(&mut self.update_queue);
        trace!(
            event = "propagate",
            node = self.node,
            phase = "update",
            count = queue.len(),
        );
        for tuple in &queue {
            match tuple.state() {
                // Retracted after it was updated.
                TupleState::Dead => continue,
                TupleState::Updating => {
                    self.consumer.update(tuple)?;
                    tuple.transition(TupleState::Ok);
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
        self.update_queue = reuse(queue);
        Ok(())
    }

    fn propagate_inserts(&mut self) -> Result<()> {
        if self.insert_queue.is_empty() {
            return Ok(());
        }
        let queue = mem::take(&mut self.insert_queue);
        trace!(
            event = "propagate",
            node = self.node,
            phase = "insert",
            count = queue.len(),
        );
        for tuple in &queue {
            match tuple.state() {
                // Aborted before it was ever announced.
                TupleState::Dead => continue,
                TupleState::Creating => {
                    self.consumer.insert(tuple)?;
                    tuple.transition(TupleState::Ok);
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
        self.insert_queue = reuse(queue);
        Ok(())
    }

    fn pending(&self) -> usize {
        self.retract_queue.len() + self.update_queue.len() + self.insert_queue.len()
    }
}

// Keeps the allocation of a drained sub-queue.
fn reuse<T>(mut queue: Vec<T>) -> Vec<T> {
    queue.clear();
    queue
}

impl<F> std::fmt::Debug for StaticPropagationQueue<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticPropagationQueue")
            .field("node", &self.node)
            .field("retracts", &self.retract_queue.len())
            .field("updates", &self.update_queue.len())
            .field("inserts", &self.insert_queue.len())
            .finish()
    }
}
