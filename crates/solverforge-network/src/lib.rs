//! SolverForge Network - Incremental tuple propagation
//!
//! This crate maintains a live dataflow network of derived tuples and
//! forwards only the insert/update/retract deltas each consumer needs:
//! - [`queue`] - Three-phase propagation queues, static and dynamic
//! - [`node`] - Filter, map, flatten, concat, join, if-exists and group nodes
//! - [`index`] - Keyed storage for the two sides of join-like nodes
//! - [`joiner`] - Joiners and filtering predicates
//! - [`collector`] - Accumulators for group nodes
//! - [`network`] - The layered driver that drains every node once per tick
//!
//! # Example
//!
//! ```
//! use solverforge_config::NetworkConfig;
//! use solverforge_core::{of_node, shared};
//! use solverforge_network::node::{FilterNode, ForEachNode};
//! use solverforge_network::Network;
//! use solverforge_test::RecordingLifecycle;
//!
//! let sink = RecordingLifecycle::new();
//! let filter = shared(FilterNode::new(|n: &i32| n % 2 == 0, 0, 0, sink.boxed()));
//! let source = shared(ForEachNode::new(1, of_node(&filter)));
//!
//! let mut network = Network::new(NetworkConfig::default());
//! network.add(0, &source).unwrap();
//! network.add(1, &filter).unwrap();
//!
//! for n in 1..=4 {
//!     source.borrow_mut().insert(n).unwrap();
//! }
//! network.settle().unwrap();
//!
//! let mut even = sink.live_facts();
//! even.sort();
//! assert_eq!(even, vec![2, 4]);
//! ```

pub mod collector;
pub mod identify;
pub mod index;
pub mod joined;
pub mod joiner;
pub mod network;
pub mod node;
pub mod queue;

pub use collector::{count, load_balance, sum, to_vec, Accumulator, UniCollector};
pub use identify::Identify;
pub use index::{Comparison, EqualsComparisonIndexer, Indexer};
pub use joined::Joined;
pub use joiner::{cross, equal, equal_bi, filtering, AndJoiner, Filtering, Joiner};
pub use network::Network;
pub use node::Node;
pub use queue::{Carrier, DynamicPropagationQueue, PropagationQueue, Propagator, StaticPropagationQueue};
