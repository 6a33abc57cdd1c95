//! Tests for the nodes.
//!
//! Each test wires one node between root nodes and a recording sink and
//! drains them by hand, upstream first.

mod concat;
mod flatten_last;

use solverforge_core::Shared;

use crate::queue::Propagator;

/// Drains `source` and then `node`, as one tick of a two-layer network.
fn settle<S: Propagator, N: Propagator>(source: &mut S, node: &Shared<N>) {
    source.propagate_everything().unwrap();
    node.borrow_mut().propagate_everything().unwrap();
}

/// Drains both roots of a two-input node and then the node.
fn settle_both<L: Propagator, R: Propagator, N: Propagator>(
    left: &mut L,
    right: &mut R,
    node: &Shared<N>,
) {
    left.propagate_everything().unwrap();
    right.propagate_everything().unwrap();
    node.borrow_mut().propagate_everything().unwrap();
}
