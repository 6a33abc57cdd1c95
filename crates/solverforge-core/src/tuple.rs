//! Tuples: the rows flowing through the network.
//!
//! A tuple carries its facts, its lifecycle state and a fixed-size scratch
//! store. Each downstream node that needs to remember something about a
//! tuple owns one or more store slots, assigned once when the network is
//! built. A node only ever touches the slots it was given.

use std::any::{type_name, Any};
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, SolverForgeError};
use crate::state::TupleState;

/// Shared handle to a tuple.
pub type TupleRef<F> = Rc<Tuple<F>>;

type Slot = Option<Box<dyn Any>>;

/// One row of facts with lifecycle state and a scratch store.
///
/// # Example
///
/// ```
/// use solverforge_core::{Tuple, TupleState};
///
/// let tuple = Tuple::new(("Ann", 3), 2);
/// assert_eq!(tuple.state(), TupleState::Dead);
///
/// tuple.set_store(1, 42usize).unwrap();
/// assert_eq!(tuple.get_store::<usize>(1).unwrap(), Some(42));
/// assert_eq!(tuple.remove_store::<usize>(1).unwrap(), Some(42));
/// assert!(!tuple.has_store(1));
/// ```
pub struct Tuple<F> {
    facts: RefCell<F>,
    state: Cell<TupleState>,
    store: RefCell<Box<[Slot]>>,
}

impl<F> Tuple<F> {
    /// Creates a tuple in the `Dead` state with `store_size` empty slots.
    pub fn new(facts: F, store_size: usize) -> TupleRef<F> {
        let store: Box<[Slot]> = (0..store_size).map(|_| None).collect();
        Rc::new(Tuple {
            facts: RefCell::new(facts),
            state: Cell::new(TupleState::Dead),
            store: RefCell::new(store),
        })
    }

    #[inline]
    pub fn facts(&self) -> Ref<'_, F> {
        self.facts.borrow()
    }

    /// Replaces the facts, returning the previous ones.
    #[inline]
    pub fn set_facts(&self, facts: F) -> F {
        self.facts.replace(facts)
    }

    /// Mutates the facts in place.
    #[inline]
    pub fn update_facts<R>(&self, f: impl FnOnce(&mut F) -> R) -> R {
        f(&mut self.facts.borrow_mut())
    }

    #[inline]
    pub fn state(&self) -> TupleState {
        self.state.get()
    }

    #[inline]
    pub fn set_state(&self, state: TupleState) {
        self.state.set(state);
    }

    #[inline]
    pub fn store_size(&self) -> usize {
        self.store.borrow().len()
    }

    /// Returns true if the slot holds a value.
    pub fn has_store(&self, index: usize) -> bool {
        self.store
            .borrow()
            .get(index)
            .is_some_and(|slot| slot.is_some())
    }

    /// Returns a clone of the value in the slot, if any.
    pub fn get_store<T: Clone + 'static>(&self, index: usize) -> Result<Option<T>> {
        let store = self.store.borrow();
        let slot = store
            .get(index)
            .ok_or(SolverForgeError::StoreIndexOutOfBounds {
                index,
                size: store.len(),
            })?;
        match slot {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or(SolverForgeError::StoreTypeMismatch {
                    index,
                    expected: type_name::<T>(),
                }),
        }
    }

    /// Puts a value into the slot, replacing whatever was there.
    pub fn set_store<T: 'static>(&self, index: usize, value: T) -> Result<()> {
        let mut store = self.store.borrow_mut();
        let size = store.len();
        let slot = store
            .get_mut(index)
            .ok_or(SolverForgeError::StoreIndexOutOfBounds { index, size })?;
        *slot = Some(Box::new(value));
        Ok(())
    }

    /// Takes the value out of the slot, leaving it empty.
    pub fn remove_store<T: 'static>(&self, index: usize) -> Result<Option<T>> {
        let mut store = self.store.borrow_mut();
        let size = store.len();
        let slot = store
            .get_mut(index)
            .ok_or(SolverForgeError::StoreIndexOutOfBounds { index, size })?;
        match slot.take() {
            None => Ok(None),
            Some(value) => match value.downcast::<T>() {
                Ok(value) => Ok(Some(*value)),
                Err(value) => {
                    *slot = Some(value);
                    Err(SolverForgeError::StoreTypeMismatch {
                        index,
                        expected: type_name::<T>(),
                    })
                }
            },
        }
    }
}

/// Identity of a tuple, stable for as long as any handle to it exists.
#[inline]
pub fn tuple_identity<F>(tuple: &TupleRef<F>) -> usize {
    Rc::as_ptr(tuple) as *const () as usize
}

impl<F: fmt::Debug> fmt::Debug for Tuple<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Tuple");
        match self.facts.try_borrow() {
            Ok(facts) => s.field("facts", &*facts),
            Err(_) => s.field("facts", &"<borrowed>"),
        };
        s.field("state", &self.state.get()).finish()
    }
}
