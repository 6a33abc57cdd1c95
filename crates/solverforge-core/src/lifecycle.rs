//! Downstream consumer contracts.
//!
//! Every node, and the terminal scorer at the end of every chain, receives
//! tuples through [`TupleLifecycle`]. Two-input nodes (joins, if-exists,
//! concat) receive their inputs through [`LeftTupleLifecycle`] and
//! [`RightTupleLifecycle`]; [`of_left`] and [`of_right`] adapt a shared node
//! to a plain single-input consumer for its upstream.

use std::any::type_name;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Result, SolverForgeError};
use crate::tuple::TupleRef;

/// Receives insert/update/retract events for tuples with facts `F`.
///
/// Consumers must not mutate the tuples they receive, except for the store
/// slots they were assigned.
pub trait TupleLifecycle<F> {
    fn insert(&mut self, tuple: &TupleRef<F>) -> Result<()>;

    fn update(&mut self, tuple: &TupleRef<F>) -> Result<()>;

    fn retract(&mut self, tuple: &TupleRef<F>) -> Result<()>;
}

/// Left input of a two-input node.
pub trait LeftTupleLifecycle<L> {
    fn insert_left(&mut self, tuple: &TupleRef<L>) -> Result<()>;

    fn update_left(&mut self, tuple: &TupleRef<L>) -> Result<()>;

    fn retract_left(&mut self, tuple: &TupleRef<L>) -> Result<()>;
}

/// Right input of a two-input node.
pub trait RightTupleLifecycle<R> {
    fn insert_right(&mut self, tuple: &TupleRef<R>) -> Result<()>;

    fn update_right(&mut self, tuple: &TupleRef<R>) -> Result<()>;

    fn retract_right(&mut self, tuple: &TupleRef<R>) -> Result<()>;
}

/// Boxed downstream consumer, as held by propagation queues.
pub type BoxedLifecycle<F> = Box<dyn TupleLifecycle<F>>;

/// Shared, interior-mutable node handle.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value in a [`Shared`] handle.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

fn borrow_node<T: ?Sized>(node: &RefCell<T>) -> Result<std::cell::RefMut<'_, T>> {
    node.try_borrow_mut()
        .map_err(|_| SolverForgeError::Reentrant {
            node: type_name::<T>(),
        })
}

impl<F, T> TupleLifecycle<F> for Rc<RefCell<T>>
where
    T: TupleLifecycle<F> + ?Sized,
{
    fn insert(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        borrow_node(&**self)?.insert(tuple)
    }

    fn update(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        borrow_node(&**self)?.update(tuple)
    }

    fn retract(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        borrow_node(&**self)?.retract(tuple)
    }
}

/// Routes a single-input stream into the left side of a shared node.
pub struct LeftInput<N: ?Sized>(pub Shared<N>);

/// Routes a single-input stream into the right side of a shared node.
pub struct RightInput<N: ?Sized>(pub Shared<N>);

impl<L, N> TupleLifecycle<L> for LeftInput<N>
where
    N: LeftTupleLifecycle<L> + ?Sized,
{
    fn insert(&mut self, tuple: &TupleRef<L>) -> Result<()> {
        borrow_node(&*self.0)?.insert_left(tuple)
    }

    fn update(&mut self, tuple: &TupleRef<L>) -> Result<()> {
        borrow_node(&*self.0)?.update_left(tuple)
    }

    fn retract(&mut self, tuple: &TupleRef<L>) -> Result<()> {
        borrow_node(&*self.0)?.retract_left(tuple)
    }
}

impl<R, N> TupleLifecycle<R> for RightInput<N>
where
    N: RightTupleLifecycle<R> + ?Sized,
{
    fn insert(&mut self, tuple: &TupleRef<R>) -> Result<()> {
        borrow_node(&*self.0)?.insert_right(tuple)
    }

    fn update(&mut self, tuple: &TupleRef<R>) -> Result<()> {
        borrow_node(&*self.0)?.update_right(tuple)
    }

    fn retract(&mut self, tuple: &TupleRef<R>) -> Result<()> {
        borrow_node(&*self.0)?.retract_right(tuple)
    }
}

/// Boxes the left side of `node` as a downstream consumer.
pub fn of_left<L, N>(node: &Shared<N>) -> BoxedLifecycle<L>
where
    L: 'static,
    N: LeftTupleLifecycle<L> + 'static,
{
    Box::new(LeftInput(Rc::clone(node)))
}

/// Boxes the right side of `node` as a downstream consumer.
pub fn of_right<R, N>(node: &Shared<N>) -> BoxedLifecycle<R>
where
    R: 'static,
    N: RightTupleLifecycle<R> + 'static,
{
    Box::new(RightInput(Rc::clone(node)))
}

/// Boxes a shared single-input node as a downstream consumer.
pub fn of_node<F, N>(node: &Shared<N>) -> BoxedLifecycle<F>
where
    F: 'static,
    N: TupleLifecycle<F> + 'static,
{
    Box::new(Rc::clone(node))
}

/// Forwards every event to several consumers, in registration order.
pub struct AggregatedTupleLifecycle<F> {
    consumers: Vec<BoxedLifecycle<F>>,
}

impl<F> AggregatedTupleLifecycle<F> {
    pub fn new(consumers: Vec<BoxedLifecycle<F>>) -> Self {
        Self { consumers }
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}

impl<F> TupleLifecycle<F> for AggregatedTupleLifecycle<F> {
    fn insert(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        for consumer in &mut self.consumers {
            consumer.insert(tuple)?;
        }
        Ok(())
    }

    fn update(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        for consumer in &mut self.consumers {
            consumer.update(tuple)?;
        }
        Ok(())
    }

    fn retract(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        for consumer in &mut self.consumers {
            consumer.retract(tuple)?;
        }
        Ok(())
    }
}

impl<F> std::fmt::Debug for AggregatedTupleLifecycle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatedTupleLifecycle")
            .field("consumers", &self.consumers.len())
            .finish()
    }
}
