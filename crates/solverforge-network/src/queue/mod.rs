//! Propagation queues.
//!
//! A node never calls its downstream consumer directly from `insert`,
//! `update` or `retract`. It files the affected carrier into its queue and
//! the queue forwards everything when the node is drained, in three phases:
//! all retracts, then all updates, then all inserts. Joins and groups further
//! down must never be probed with a half-updated world.
//!
//! [`StaticPropagationQueue`] files a tuple into a fixed sub-queue the
//! moment it is reported. [`DynamicPropagationQueue`] keeps one dirty list
//! and re-classifies carriers in place, for groups and exists-counters whose
//! fate can flip several times before the tick ends.

mod dynamic_queue;
mod static_queue;


use std::rc::Rc;

use solverforge_core::{tuple_identity, Result, TupleRef, TupleState};

pub use dynamic_queue::DynamicPropagationQueue;
pub use static_queue::StaticPropagationQueue;

/// Something that can sit in a propagation queue.
///
/// For simple nodes the carrier is the output tuple itself. Group and
/// if-exists nodes enqueue a wrapper whose state decides what happens to
/// the tuple it announces.
pub trait Carrier<F> {
    fn state(&self) -> TupleState;

    fn set_state(&self, state: TupleState);

    /// Moves the carrier to `next`, which must be a legal successor of its
    /// current state.
    #[inline]
    fn transition(&self, next: TupleState) {
        let current = self.state();
        debug_assert!(
            current.can_transition_to(next),
            "illegal tuple state transition {current} -> {next}"
        );
        self.set_state(next);
    }

    /// The tuple announced downstream when this carrier is propagated.
    fn tuple(&self) -> TupleRef<F>;

    /// Identity of the carrier, stable while the queue holds it.
    fn carrier_id(&self) -> usize;
}

impl<F> Carrier<F> for TupleRef<F> {
    #[inline]
    fn state(&self) -> TupleState {
        Rc::as_ref(self).state()
    }

    #[inline]
    fn set_state(&self, state: TupleState) {
        Rc::as_ref(self).set_state(state);
    }

    #[inline]
    fn tuple(&self) -> TupleRef<F> {
        Rc::clone(self)
    }

    #[inline]
    fn carrier_id(&self) -> usize {
        tuple_identity(self)
    }
}

/// Filing side of a queue.
pub trait PropagationQueue<C> {
    /// Schedules a fresh carrier for insertion.
    fn insert(&mut self, carrier: C) -> Result<()>;

    /// Schedules a propagated carrier for an update.
    fn update(&mut self, carrier: C) -> Result<()>;

    /// Schedules a carrier for retraction. `state` is `Dying` or `Aborting`.
    fn retract(&mut self, carrier: C, state: TupleState) -> Result<()>;
}

/// Draining side of a queue, and of every node that owns one.
pub trait Propagator {
    fn propagate_retracts(&mut self) -> Result<()>;

    fn propagate_updates(&mut self) -> Result<()>;

    fn propagate_inserts(&mut self) -> Result<()>;

    /// Runs all three phases in order.
    fn propagate_everything(&mut self) -> Result<()> {
        self.propagate_retracts()?;
        self.propagate_updates()?;
        self.propagate_inserts()
    }

    /// Number of carriers waiting to be propagated.
    fn pending(&self) -> usize;
}

/// Files `carrier` for retraction in the state that matches how far it got:
/// `Aborting` if it was never announced, `Dying` otherwise.
pub fn retract_carrier<F, C, Q>(queue: &mut Q, carrier: C, node: &'static str) -> Result<()>
where
    C: Carrier<F>,
    Q: PropagationQueue<C> + ?Sized,
{
    let state = carrier.state();
    match state.retract_target() {
        Some(target) => queue.retract(carrier, target),
        None => Err(solverforge_core::SolverForgeError::impossible(
            node, state, "retract",
        )),
    }
}
