//! SolverForge Core - Tuple model for the incremental constraint network
//!
//! This crate provides the leaves of the network's dependency order:
//! - [`TupleState`], the lifecycle state machine shared by all carriers
//! - [`Tuple`], a row of facts with a per-node scratch store
//! - [`Arena`] and [`ElementAwareLists`], generational storage for
//!   backpointer lists with O(1) removal
//! - [`TupleLifecycle`] and friends, the downstream consumer contracts
//! - [`SolverForgeError`], the error taxonomy of the network

pub mod arena;
pub mod element_list;
pub mod error;
pub mod lifecycle;
pub mod state;
pub mod tuple;

#[cfg(test)]
mod arena_tests;
#[cfg(test)]
mod element_list_tests;
#[cfg(test)]
mod lifecycle_tests;

pub use arena::{Arena, Handle};
pub use element_list::{ElementAwareLists, EntryId, ListId};
pub use error::{Result, SolverForgeError};
pub use lifecycle::{
    of_left, of_node, of_right, shared, AggregatedTupleLifecycle, BoxedLifecycle, LeftInput,
    LeftTupleLifecycle, RightInput, RightTupleLifecycle, Shared, TupleLifecycle,
};
pub use state::TupleState;
pub use tuple::{tuple_identity, Tuple, TupleRef};
