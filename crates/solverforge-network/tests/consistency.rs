// Random churn against the scheduling network.
//
// After every tick the live tuples at both sinks must equal what a full
// recalculation over the current facts produces, and every tick must reach a
// sink as retracts, then updates, then inserts.

mod common;

use std::collections::BTreeMap;

use common::Scheduling;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use solverforge_config::{EnvironmentMode, NetworkConfig};
use solverforge_core::TupleRef;
use solverforge_test::{init_test_logging, Employee, RecordingLifecycle, Shift};

const EMPLOYEES: usize = 5;
const TICKS: usize = 150;

struct World {
    shifts: Vec<TupleRef<Shift>>,
    employees: Vec<Option<TupleRef<Employee>>>,
    next_shift: usize,
}

impl World {
    fn new() -> Self {
        Self {
            shifts: Vec::new(),
            employees: vec![None; EMPLOYEES],
            next_shift: 0,
        }
    }

    fn expected_workload(&self) -> Vec<(usize, i64)> {
        let mut totals = BTreeMap::new();
        for shift in &self.shifts {
            let shift = shift.facts();
            let Some(employee) = shift.employee else {
                continue;
            };
            if self.employees[employee].is_some() && shift.duration() > 0 {
                *totals.entry(employee).or_insert(0) += shift.duration();
            }
        }
        totals.into_iter().collect()
    }

    fn expected_idle(&self) -> Vec<usize> {
        (0..EMPLOYEES)
            .filter(|&id| self.employees[id].is_some())
            .filter(|&id| !self.shifts.iter().any(|s| s.facts().employee == Some(id)))
            .collect()
    }
}

fn random_employee(rng: &mut ChaCha8Rng) -> Option<usize> {
    if rng.random_bool(0.25) {
        None
    } else {
        Some(rng.random_range(0..EMPLOYEES))
    }
}

fn mutate(s: &Scheduling, world: &mut World, rng: &mut ChaCha8Rng) {
    match rng.random_range(0..10) {
        0..=2 => {
            let start = rng.random_range(0..24);
            let end = start + rng.random_range(0..6);
            let shift = Shift::new(world.next_shift, random_employee(rng), start, end);
            world.next_shift += 1;
            world.shifts.push(s.shifts.borrow_mut().insert(shift).unwrap());
        }
        3..=4 if !world.shifts.is_empty() => {
            let tuple = &world.shifts[rng.random_range(0..world.shifts.len())];
            let employee = random_employee(rng);
            s.shifts
                .borrow_mut()
                .update_with(tuple, |shift| shift.employee = employee)
                .unwrap();
        }
        5 if !world.shifts.is_empty() => {
            let tuple = &world.shifts[rng.random_range(0..world.shifts.len())];
            let start = rng.random_range(0..24);
            let end = start + rng.random_range(0..6);
            s.shifts
                .borrow_mut()
                .update_with(tuple, |shift| {
                    shift.start = start;
                    shift.end = end;
                })
                .unwrap();
        }
        6..=7 if !world.shifts.is_empty() => {
            let tuple = world.shifts.swap_remove(rng.random_range(0..world.shifts.len()));
            s.shifts.borrow_mut().retract(&tuple).unwrap();
        }
        8 => {
            let id = rng.random_range(0..EMPLOYEES);
            match world.employees[id].take() {
                Some(tuple) => s.employees.borrow_mut().retract(&tuple).unwrap(),
                None => {
                    let tuple = s
                        .employees
                        .borrow_mut()
                        .insert(Employee::new(id, format!("Employee {id}")))
                        .unwrap();
                    world.employees[id] = Some(tuple);
                }
            }
        }
        9 => {
            let id = rng.random_range(0..EMPLOYEES);
            if let Some(tuple) = &world.employees[id] {
                let suffix = rng.random_range(0..100);
                s.employees
                    .borrow_mut()
                    .update_with(tuple, |e| e.name = format!("Employee {id}.{suffix}"))
                    .unwrap();
            }
        }
        _ => {}
    }
}

fn run(seed: u64, config: NetworkConfig) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut s = Scheduling::new(config).unwrap();
    let mut world = World::new();

    for tick in 0..TICKS {
        for _ in 0..rng.random_range(1..=6) {
            mutate(&s, &mut world, &mut rng);
        }
        s.network.settle().unwrap();

        let mut workload = s.workload.live_facts();
        workload.sort();
        assert_eq!(workload, world.expected_workload(), "seed {seed}, tick {tick}");

        let mut idle: Vec<usize> = s.idle.live_facts().iter().map(|e| e.id).collect();
        idle.sort();
        assert_eq!(idle, world.expected_idle(), "seed {seed}, tick {tick}");

        assert!(RecordingLifecycle::is_phase_ordered(&s.workload.take_events()));
        assert!(RecordingLifecycle::is_phase_ordered(&s.idle.take_events()));
    }
    assert_eq!(s.network.pending().unwrap(), 0);
}

#[test]
fn test_random_churn_matches_recalculation() {
    init_test_logging();
    for seed in 0..4 {
        run(seed, NetworkConfig::default());
    }
}

#[test]
fn test_random_churn_in_full_assert_mode() {
    let config = NetworkConfig::default().with_environment_mode(EnvironmentMode::FullAssert);
    for seed in 100..102 {
        run(seed, config.clone());
    }
}
