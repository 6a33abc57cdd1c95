//! Nodes of the network.
//!
//! Every node receives tuples through the lifecycle traits of
//! `solverforge_core`, files its own output carriers into a propagation
//! queue and forwards them when the driver drains it. The node keeps what
//! it needs to remember about an input tuple in the store slots it was
//! assigned on that tuple.

mod concat;
mod filter;
mod flatten_last;
mod for_each;
mod group;
mod if_exists;
mod join;
mod map;

#[cfg(test)]
mod tests;

use solverforge_config::NetworkConfig;
use solverforge_core::{Result, SolverForgeError, TupleRef};

use crate::queue::Propagator;

pub use concat::ConcatNode;
pub use filter::FilterNode;
pub use flatten_last::FlattenLastNode;
pub use for_each::ForEachNode;
pub use group::{Group, GroupNode, GroupStores, NoAccumulator, NoCollector};
pub use if_exists::{ExistsCounter, IfExistsNode, IfExistsStores, UnindexedIfExistsNode};
pub use join::{JoinNode, JoinStores, UnindexedJoinNode};
pub use map::MapNode;

/// A dataflow stage the driver can drain.
pub trait Node: Propagator {
    /// Short type name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Applies network-wide settings. Called once, when the node is added
    /// to a network and before any tuple reaches it.
    fn configure(&mut self, config: &NetworkConfig) -> Result<()>;

    /// Forwards everything this node has queued since the last tick.
    fn calculate_score(&mut self) -> Result<()> {
        self.propagate_everything()
    }
}

/// Rejects a second insert of a tuple whose slot is already taken.
pub(crate) fn ensure_vacant<F>(tuple: &TupleRef<F>, store_index: usize, node: &'static str) -> Result<()> {
    if tuple.has_store(store_index) {
        return Err(SolverForgeError::DuplicateInsert { node });
    }
    Ok(())
}

/// A slot the node itself filled is gone.
pub(crate) fn lost_slot(node: &'static str, what: &str) -> SolverForgeError {
    SolverForgeError::Internal(format!("{node} lost the {what} it stored"))
}
