//! Layered driver for a network of nodes.
//!
//! Nodes are added to numbered layers: a node's layer must be greater than
//! the layer of every node feeding it. [`Network::settle`] drains the
//! layers in ascending order, once per tick, after the caller has fed all
//! fact changes of that tick into the root nodes.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use solverforge_config::NetworkConfig;
use solverforge_core::{Result, Shared, SolverForgeError};
use tracing::{debug, info, trace};

use crate::node::Node;

type NodeRef = Rc<RefCell<dyn Node>>;

struct Entry {
    name: &'static str,
    node: NodeRef,
}

impl Entry {
    fn borrow(&self) -> Result<RefMut<'_, dyn Node + 'static>> {
        self.node
            .try_borrow_mut()
            .map_err(|_| SolverForgeError::Reentrant { node: self.name })
    }
}

/// Owns the drain order of a set of shared nodes.
///
/// A layer with a single node drains it in one go. Within a layer of
/// several nodes every node finishes its retracts before any node starts
/// its updates, and all updates finish before any insert, so that nodes
/// sharing a consumer still deliver to it in phase order.
pub struct Network {
    config: NetworkConfig,
    layers: Vec<Vec<Entry>>,
    tick: u64,
}

impl Network {
    pub fn new(config: NetworkConfig) -> Self {
        info!(
            event = "network_configured",
            environment_mode = ?config.environment_mode,
            queue_capacity = config.queue_capacity,
        );
        Self {
            config,
            layers: Vec::new(),
            tick: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Configures `node` and schedules it in `layer`.
    pub fn add<N: Node + 'static>(&mut self, layer: usize, node: &Shared<N>) -> Result<()> {
        let name = {
            let mut guard = node
                .try_borrow_mut()
                .map_err(|_| SolverForgeError::Reentrant {
                    node: std::any::type_name::<N>(),
                })?;
            guard.configure(&self.config)?;
            guard.name()
        };
        if self.layers.len() <= layer {
            self.layers.resize_with(layer + 1, Vec::new);
        }
        let node: NodeRef = Rc::clone(node) as NodeRef;
        self.layers[layer].push(Entry { name, node });
        Ok(())
    }

    /// Number of layers, empty ones included.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn node_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// Number of ticks settled so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Carriers waiting in any node.
    pub fn pending(&self) -> Result<usize> {
        let mut pending = 0;
        for entry in self.layers.iter().flatten() {
            pending += entry.borrow()?.pending();
        }
        Ok(pending)
    }

    /// Propagates everything fed since the last tick through all layers.
    pub fn settle(&mut self) -> Result<()> {
        self.tick += 1;
        debug!(
            event = "tick",
            tick = self.tick,
            layers = self.layers.len(),
            nodes = self.node_count(),
        );
        for (index, layer) in self.layers.iter().enumerate() {
            match layer.as_slice() {
                [] => {}
                [entry] => {
                    trace!(event = "drain", layer = index, node = entry.name);
                    entry.borrow()?.calculate_score()?;
                }
                entries => {
                    trace!(event = "drain", layer = index, nodes = entries.len());
                    for entry in entries {
                        entry.borrow()?.propagate_retracts()?;
                    }
                    for entry in entries {
                        entry.borrow()?.propagate_updates()?;
                    }
                    for entry in entries {
                        entry.borrow()?.propagate_inserts()?;
                    }
                }
            }
        }
        if self.config.environment_mode.is_asserted() {
            self.assert_drained()?;
        }
        Ok(())
    }

    fn assert_drained(&self) -> Result<()> {
        for entry in self.layers.iter().flatten() {
            let pending = entry.borrow()?.pending();
            if pending > 0 {
                return Err(SolverForgeError::Internal(format!(
                    "{} still holds {pending} carriers after tick {}; is it in a layer below one of its inputs?",
                    entry.name, self.tick
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("layers", &self.layers.len())
            .field("nodes", &self.node_count())
            .field("tick", &self.tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use solverforge_config::EnvironmentMode;
    use solverforge_core::{of_node, shared};
    use solverforge_test::{EventKind, RecordingLifecycle};

    use super::*;
    use crate::node::{ForEachNode, MapNode};

    #[test]
    fn test_settle_drains_layers_in_order() {
        let sink = RecordingLifecycle::new();
        let map = shared(MapNode::new(|n: &i32| n * 10, 0, 0, sink.boxed()));
        let source = shared(ForEachNode::new(1, of_node(&map)));

        let mut network = Network::new(NetworkConfig::default());
        network.add(0, &source).unwrap();
        network.add(1, &map).unwrap();

        source.borrow_mut().insert(4).unwrap();
        network.settle().unwrap();

        assert_eq!(sink.live_facts(), vec![40]);
        assert_eq!(network.tick(), 1);
        assert_eq!(network.pending().unwrap(), 0);
    }

    #[test]
    fn test_wrong_layer_order_leaves_work_behind() {
        let sink = RecordingLifecycle::new();
        let map = shared(MapNode::new(|n: &i32| n + 1, 0, 0, sink.boxed()));
        let source = shared(ForEachNode::new(1, of_node(&map)));

        let mut network = Network::new(NetworkConfig::default());
        network.add(1, &source).unwrap();
        network.add(0, &map).unwrap();

        source.borrow_mut().insert(1).unwrap();
        network.settle().unwrap();
        assert!(sink.events().is_empty());
        assert_eq!(network.pending().unwrap(), 1);

        // The next tick picks it up.
        network.settle().unwrap();
        assert_eq!(sink.kinds(), vec![EventKind::Insert]);
    }

    #[test]
    fn test_asserted_mode_rejects_leftover_work() {
        let sink = RecordingLifecycle::new();
        let map = shared(MapNode::new(|n: &i32| n + 1, 0, 0, sink.boxed()));
        let source = shared(ForEachNode::new(1, of_node(&map)));

        let config = NetworkConfig::new().with_environment_mode(EnvironmentMode::FullAssert);
        let mut network = Network::new(config);
        network.add(1, &source).unwrap();
        network.add(0, &map).unwrap();

        source.borrow_mut().insert(1).unwrap();
        let err = network.settle().unwrap_err();
        assert!(matches!(err, SolverForgeError::Internal(_)));
    }

    #[test]
    fn test_add_while_borrowed_is_reentrant() {
        let sink = RecordingLifecycle::<i32>::new();
        let source = shared(ForEachNode::new(0, sink.boxed()));
        let mut network = Network::new(NetworkConfig::default());

        let _guard = source.borrow_mut();
        let err = network.add(0, &source).unwrap_err();
        assert!(matches!(err, SolverForgeError::Reentrant { .. }));
    }

    #[test]
    fn test_counts() {
        let sink = RecordingLifecycle::<i32>::new();
        let source = shared(ForEachNode::new(0, sink.boxed()));
        let mut network = Network::new(NetworkConfig::default());
        network.add(2, &source).unwrap();

        assert_eq!(network.layer_count(), 3);
        assert_eq!(network.node_count(), 1);
    }
}
