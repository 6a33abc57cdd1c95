use std::rc::Rc;

use solverforge_core::{of_node, shared};
use solverforge_test::fixtures::employees;
use solverforge_test::{Employee, EventKind, RecordingLifecycle};

use super::settle;
use crate::node::{FlattenLastNode, ForEachNode};

#[test]
fn test_reconciles_items_by_identity() {
    let sink = RecordingLifecycle::new();
    let flatten = shared(FlattenLastNode::new(
        |items: &Vec<u32>| items.clone(),
        |_: &Vec<u32>, item: &u32| *item,
        0,
        0,
        sink.boxed(),
    ));
    let mut source = ForEachNode::new(1, of_node(&flatten));

    let tuple = source.insert(vec![1, 2]).unwrap();
    settle(&mut source, &flatten);
    let inserted = sink.take_events();
    assert_eq!(inserted.len(), 2);
    let id_of_2 = inserted.iter().find(|e| e.facts == 2).unwrap().tuple;

    source.update(&tuple, vec![2, 3]).unwrap();
    settle(&mut source, &flatten);

    let events = sink.events();
    assert_eq!(
        sink.kinds(),
        vec![EventKind::Retract, EventKind::Update, EventKind::Insert]
    );
    assert_eq!(events[0].facts, 1);
    assert_eq!(events[1].facts, 2);
    assert_eq!(events[1].tuple, id_of_2);
    assert_eq!(events[2].facts, 3);
}

#[test]
fn test_shared_items_compare_by_pointer() {
    let staff = employees(2);
    let sink = RecordingLifecycle::new();
    let flatten = shared(FlattenLastNode::new(
        |team: &(String, Vec<Rc<Employee>>)| team.1.clone(),
        |team: &(String, Vec<Rc<Employee>>), member: &Rc<Employee>| {
            (team.0.clone(), member.name.clone())
        },
        0,
        0,
        sink.boxed(),
    ));
    let mut source = ForEachNode::new(1, of_node(&flatten));

    let team = source
        .insert(("red".to_string(), vec![Rc::clone(&staff[0])]))
        .unwrap();
    settle(&mut source, &flatten);

    // An equal but distinct employee is a different item.
    let twin = Rc::new(Employee::new(0, "Employee 0"));
    source.update(&team, ("blue".to_string(), vec![twin])).unwrap();
    settle(&mut source, &flatten);

    assert_eq!(
        sink.kinds(),
        vec![EventKind::Insert, EventKind::Retract, EventKind::Insert]
    );
    assert_eq!(
        sink.live_facts(),
        vec![("blue".to_string(), "Employee 0".to_string())]
    );
}

#[test]
fn test_duplicate_items_each_get_an_output() {
    let sink = RecordingLifecycle::new();
    let flatten = shared(FlattenLastNode::new(
        |items: &Vec<u8>| items.clone(),
        |_: &Vec<u8>, item: &u8| *item,
        0,
        0,
        sink.boxed(),
    ));
    let mut source = ForEachNode::new(1, of_node(&flatten));

    let tuple = source.insert(vec![4, 4]).unwrap();
    settle(&mut source, &flatten);
    assert_eq!(sink.live_count(), 2);

    source.update(&tuple, vec![4]).unwrap();
    settle(&mut source, &flatten);
    assert_eq!(sink.live_facts(), vec![4]);
    assert_eq!(sink.count(EventKind::Retract), 1);

    source.retract(&tuple).unwrap();
    settle(&mut source, &flatten);
    assert_eq!(sink.live_count(), 0);
}

#[test]
fn test_empty_list_produces_nothing() {
    let sink = RecordingLifecycle::new();
    let flatten = shared(FlattenLastNode::new(
        |items: &Vec<u8>| items.clone(),
        |_: &Vec<u8>, item: &u8| *item,
        0,
        0,
        sink.boxed(),
    ));
    let mut source = ForEachNode::new(1, of_node(&flatten));

    let tuple = source.insert(Vec::new()).unwrap();
    settle(&mut source, &flatten);
    assert!(sink.events().is_empty());
    assert!(!tuple.has_store(0));

    source.update(&tuple, vec![1]).unwrap();
    settle(&mut source, &flatten);
    assert_eq!(sink.kinds(), vec![EventKind::Insert]);
    assert!(tuple.has_store(0));
}

#[test]
fn test_emptied_list_vacates_the_slot() {
    let sink = RecordingLifecycle::new();
    let flatten = shared(FlattenLastNode::new(
        |items: &Vec<u8>| items.clone(),
        |_: &Vec<u8>, item: &u8| *item,
        0,
        0,
        sink.boxed(),
    ));
    let mut source = ForEachNode::new(1, of_node(&flatten));

    let tuple = source.insert(vec![1, 2]).unwrap();
    settle(&mut source, &flatten);

    source.update(&tuple, Vec::new()).unwrap();
    settle(&mut source, &flatten);
    assert!(!tuple.has_store(0));
    assert_eq!(sink.live_count(), 0);

    // Nothing left to retract.
    source.retract(&tuple).unwrap();
    settle(&mut source, &flatten);
    assert_eq!(sink.count(EventKind::Retract), 2);

    // A vacant slot re-inserts on update.
    let other = source.insert(Vec::new()).unwrap();
    settle(&mut source, &flatten);
    source.update(&other, vec![7]).unwrap();
    settle(&mut source, &flatten);
    assert_eq!(sink.live_facts(), vec![7]);
}
