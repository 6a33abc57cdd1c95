use solverforge_core::{of_left, of_right, shared, AggregatedTupleLifecycle};
use solverforge_test::{EventKind, RecordingLifecycle};

use super::{settle, settle_both};
use crate::node::{ConcatNode, ForEachNode};

#[test]
fn test_union_of_both_sides() {
    let sink = RecordingLifecycle::new();
    let concat = shared(ConcatNode::new(0, 0, 0, sink.boxed()));
    let mut left = ForEachNode::new(1, of_left(&concat));
    let mut right = ForEachNode::new(1, of_right(&concat));

    let a = left.insert('a').unwrap();
    right.insert('b').unwrap();
    settle_both(&mut left, &mut right, &concat);

    let mut live = sink.live_facts();
    live.sort();
    assert_eq!(live, vec!['a', 'b']);

    left.retract(&a).unwrap();
    settle_both(&mut left, &mut right, &concat);
    assert_eq!(sink.live_facts(), vec!['b']);
}

#[test]
fn test_same_tuple_on_both_sides_gives_two_outputs() {
    let sink = RecordingLifecycle::new();
    let concat = shared(ConcatNode::new(0, 1, 0, sink.boxed()));
    let both = AggregatedTupleLifecycle::new(vec![of_left(&concat), of_right(&concat)]);
    let mut source = ForEachNode::new(2, Box::new(both));

    let tuple = source.insert(7).unwrap();
    settle(&mut source, &concat);
    assert_eq!(sink.live_count(), 2);

    source.update(&tuple, 8).unwrap();
    settle(&mut source, &concat);
    assert_eq!(sink.count(EventKind::Update), 2);
    assert_eq!(sink.live_facts(), vec![8, 8]);
}
