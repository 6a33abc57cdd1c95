//! Root node fed by the driver.

use std::rc::Rc;

use solverforge_config::NetworkConfig;
use solverforge_core::{BoxedLifecycle, Result, SolverForgeError, Tuple, TupleRef, TupleState};

use super::Node;
use crate::queue::{retract_carrier, PropagationQueue, Propagator, StaticPropagationQueue};

const NODE: &str = "ForEachNode";

/// Entry point of a fact type into the network.
///
/// The driver inserts raw facts here and keeps the returned tuple as the
/// handle for later updates and retracts.
///
/// # Example
///
/// ```
/// use solverforge_core::TupleState;
/// use solverforge_network::node::ForEachNode;
/// use solverforge_network::queue::Propagator;
/// use solverforge_test::RecordingLifecycle;
///
/// let sink = RecordingLifecycle::new();
/// let mut node = ForEachNode::new(0, sink.boxed());
///
/// let tuple = node.insert(7).unwrap();
/// assert_eq!(tuple.state(), TupleState::Creating);
///
/// node.propagate_everything().unwrap();
/// assert_eq!(sink.live_facts(), vec![7]);
/// ```
pub struct ForEachNode<A> {
    store_size: usize,
    queue: StaticPropagationQueue<A>,
}

impl<A> ForEachNode<A> {
    /// `store_size` is the number of slots downstream nodes reserved on
    /// tuples of this fact type.
    pub fn new(store_size: usize, consumer: BoxedLifecycle<A>) -> Self {
        Self {
            store_size,
            queue: StaticPropagationQueue::new(NODE, consumer),
        }
    }

    pub fn insert(&mut self, fact: A) -> Result<TupleRef<A>> {
        let tuple = Tuple::new(fact, self.store_size);
        self.queue.insert(Rc::clone(&tuple))?;
        Ok(tuple)
    }

    /// Replaces the facts of a live tuple.
    pub fn update(&mut self, tuple: &TupleRef<A>, fact: A) -> Result<()> {
        self.update_with(tuple, |facts| *facts = fact)
    }

    /// Mutates the facts of a live tuple in place. Also used to announce a
    /// change that equality cannot see.
    pub fn update_with(&mut self, tuple: &TupleRef<A>, f: impl FnOnce(&mut A)) -> Result<()> {
        match tuple.state() {
            TupleState::Creating | TupleState::Updating | TupleState::Ok => {
                tuple.update_facts(f);
                self.queue.update(Rc::clone(tuple))
            }
            state => Err(SolverForgeError::impossible(NODE, state, "update")),
        }
    }

    pub fn retract(&mut self, tuple: &TupleRef<A>) -> Result<()> {
        retract_carrier(&mut self.queue, Rc::clone(tuple), NODE)
    }
}

impl<A> Propagator for ForEachNode<A> {
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

impl<A> Node for ForEachNode<A> {
    fn name(&self) -> &'static str {
        NODE
    }

    fn configure(&mut self, config: &NetworkConfig) -> Result<()> {
        self.queue.reserve(config.queue_capacity);
        Ok(())
    }
}
