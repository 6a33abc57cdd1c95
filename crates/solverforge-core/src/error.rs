//! Error types for SolverForge

use thiserror::Error;

use crate::state::TupleState;

/// Main error type for SolverForge network operations.
///
/// Every variant except `Config` signals that the network's internal state can
/// no longer be trusted. Nothing inside the network recovers from them.
#[derive(Debug, Error)]
pub enum SolverForgeError {
    /// A tuple or carrier was observed in a state the caller did not expect.
    #[error("Impossible state: the tuple in node ({node}) is in an unexpected state ({state}) during {action}")]
    ImpossibleState {
        node: &'static str,
        state: TupleState,
        action: &'static str,
    },

    /// An input tuple was inserted twice into the same node.
    #[error("Impossible state: the input for the tuple was already added in the tuple store of node ({node})")]
    DuplicateInsert { node: &'static str },

    /// A group key's hash changed while it was live in a group map.
    #[error("Hash of group key ({key}) has changed while it was being used as a group key; group keys must hash consistently")]
    GroupKeyChanged { key: String },

    /// A group was expected in the group map but is absent.
    #[error("Impossible state: the group for the group key ({key}) doesn't exist in the group map")]
    MissingGroup { key: String },

    /// A generational arena handle no longer refers to a live element.
    #[error("Stale arena handle")]
    StaleHandle,

    /// A node addressed a store slot outside the tuple's store.
    #[error("Store index ({index}) is out of bounds for a tuple store of size ({size})")]
    StoreIndexOutOfBounds { index: usize, size: usize },

    /// A store slot holds a value of another type than requested.
    #[error("Store index ({index}) does not hold a value of type ({expected})")]
    StoreTypeMismatch {
        index: usize,
        expected: &'static str,
    },

    /// A node was called while it was already borrowed, e.g. while draining.
    #[error("Node ({node}) was re-entered while it was already in use")]
    Reentrant { node: &'static str },

    /// Error in network configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SolverForgeError {
    /// Shorthand for [`SolverForgeError::ImpossibleState`].
    pub fn impossible(node: &'static str, state: TupleState, action: &'static str) -> Self {
        SolverForgeError::ImpossibleState {
            node,
            state,
            action,
        }
    }
}

/// Result type alias for SolverForge operations
pub type Result<T> = std::result::Result<T, SolverForgeError>;
