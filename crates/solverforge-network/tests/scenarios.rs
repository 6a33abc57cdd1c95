// End-to-end scheduling scenarios driven through a Network.

mod common;

use common::Scheduling;
use solverforge_config::NetworkConfig;
use solverforge_test::{init_test_logging, Employee, EventKind, Shift};

fn workload(s: &Scheduling) -> Vec<(usize, i64)> {
    let mut live = s.workload.live_facts();
    live.sort();
    live
}

fn idle(s: &Scheduling) -> Vec<usize> {
    let mut ids: Vec<usize> = s.idle.live_facts().iter().map(|e| e.id).collect();
    ids.sort();
    ids
}

#[test]
fn test_workload_follows_reassignment() {
    init_test_logging();
    let mut s = Scheduling::new(NetworkConfig::default()).unwrap();

    s.employees.borrow_mut().insert(Employee::new(0, "Ann")).unwrap();
    s.employees.borrow_mut().insert(Employee::new(1, "Bob")).unwrap();
    s.shifts.borrow_mut().insert(Shift::new(0, Some(0), 0, 8)).unwrap();
    let late = s.shifts.borrow_mut().insert(Shift::new(1, Some(0), 8, 12)).unwrap();
    s.shifts.borrow_mut().insert(Shift::new(2, None, 0, 4)).unwrap();
    s.network.settle().unwrap();

    assert_eq!(workload(&s), vec![(0, 12)]);
    assert_eq!(idle(&s), vec![1]);
    s.workload.take_events();
    s.idle.take_events();

    let moved = late.facts().assigned(Some(1));
    s.shifts.borrow_mut().update(&late, moved).unwrap();
    s.network.settle().unwrap();

    assert_eq!(workload(&s), vec![(0, 8), (1, 4)]);
    assert_eq!(s.workload.kinds(), vec![EventKind::Update, EventKind::Insert]);
    assert!(idle(&s).is_empty());
    assert_eq!(s.idle.kinds(), vec![EventKind::Retract]);
}

#[test]
fn test_retracting_employee_drops_their_workload() {
    let mut s = Scheduling::new(NetworkConfig::default()).unwrap();

    let ann = s.employees.borrow_mut().insert(Employee::new(0, "Ann")).unwrap();
    s.employees.borrow_mut().insert(Employee::new(1, "Bob")).unwrap();
    s.shifts.borrow_mut().insert(Shift::new(0, Some(0), 0, 8)).unwrap();
    let open = s.shifts.borrow_mut().insert(Shift::new(1, None, 8, 12)).unwrap();
    s.network.settle().unwrap();
    assert_eq!(workload(&s), vec![(0, 8)]);

    s.employees.borrow_mut().retract(&ann).unwrap();
    s.network.settle().unwrap();
    assert!(workload(&s).is_empty());
    assert_eq!(idle(&s), vec![1]);

    let taken = open.facts().assigned(Some(1));
    s.shifts.borrow_mut().update(&open, taken).unwrap();
    s.network.settle().unwrap();
    assert_eq!(workload(&s), vec![(1, 4)]);
    assert!(idle(&s).is_empty());
}

#[test]
fn test_zero_length_shift_counts_for_idleness_but_not_workload() {
    let mut s = Scheduling::new(NetworkConfig::default()).unwrap();

    s.employees.borrow_mut().insert(Employee::new(0, "Ann")).unwrap();
    let shift = s.shifts.borrow_mut().insert(Shift::new(0, Some(0), 5, 5)).unwrap();
    s.network.settle().unwrap();

    // The join filters the empty shift out, the idleness check has no filter.
    assert!(workload(&s).is_empty());
    assert!(idle(&s).is_empty());

    s.shifts
        .borrow_mut()
        .update_with(&shift, |shift| shift.end = 9)
        .unwrap();
    s.network.settle().unwrap();
    assert_eq!(workload(&s), vec![(0, 4)]);
}

#[test]
fn test_renaming_employee_updates_in_place() {
    let mut s = Scheduling::new(NetworkConfig::default()).unwrap();

    let ann = s.employees.borrow_mut().insert(Employee::new(0, "Ann")).unwrap();
    s.shifts.borrow_mut().insert(Shift::new(0, Some(0), 0, 8)).unwrap();
    s.shifts.borrow_mut().insert(Shift::new(1, Some(0), 8, 10)).unwrap();
    s.network.settle().unwrap();
    let before = s.workload.take_events();
    assert_eq!(before.len(), 1);

    s.employees
        .borrow_mut()
        .update_with(&ann, |e| e.name = "Anna".to_string())
        .unwrap();
    s.network.settle().unwrap();

    let after = s.workload.take_events();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].kind, EventKind::Update);
    assert_eq!(after[0].tuple, before[0].tuple);
    assert_eq!(after[0].facts, (0, 10));
}

#[test]
fn test_asserted_config_settles_cleanly() {
    let config = NetworkConfig::from_toml_str(r#"environment_mode = "full_assert""#).unwrap();
    let mut s = Scheduling::new(config).unwrap();
    assert_eq!(s.network.node_count(), 6);
    assert_eq!(s.network.layer_count(), 4);

    s.employees.borrow_mut().insert(Employee::new(0, "Ann")).unwrap();
    let shift = s.shifts.borrow_mut().insert(Shift::new(0, Some(0), 0, 8)).unwrap();
    s.network.settle().unwrap();
    s.shifts.borrow_mut().retract(&shift).unwrap();
    s.network.settle().unwrap();

    assert_eq!(s.network.tick(), 2);
    assert_eq!(s.network.pending().unwrap(), 0);
    assert!(workload(&s).is_empty());
    assert_eq!(idle(&s), vec![0]);
    assert_eq!(s.workload.kinds(), vec![EventKind::Insert, EventKind::Retract]);
}
