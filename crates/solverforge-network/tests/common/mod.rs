//! Shared wiring for the integration tests: an employee scheduling network.
//!
//! ```text
//! layer 0   shifts ─────────────┐            employees
//!              │                │             │      │
//! layer 1   filter(assigned)    └─► if_not_exists ◄──┘
//!              │                        │
//! layer 2   join(shift.employee == employee.id)   idle sink
//!              │
//! layer 3   group(employee.id, sum(duration))
//!              │
//!           workload sink
//! ```

use solverforge_config::NetworkConfig;
use solverforge_core::{of_left, of_node, of_right, shared, AggregatedTupleLifecycle, Result, Shared};
use solverforge_network::collector::sum;
use solverforge_network::joiner::{equal_bi, filtering};
use solverforge_network::node::{
    FilterNode, ForEachNode, GroupNode, GroupStores, IfExistsNode, IfExistsStores, JoinNode,
    JoinStores,
};
use solverforge_network::Network;
use solverforge_test::{Employee, RecordingLifecycle, Shift};

pub type Assignment = (Shift, Employee);
pub type Workload = (usize, i64);

pub struct Scheduling {
    pub network: Network,
    pub shifts: Shared<ForEachNode<Shift>>,
    pub employees: Shared<ForEachNode<Employee>>,
    pub workload: RecordingLifecycle<Workload>,
    pub idle: RecordingLifecycle<Employee>,
}

fn assigned(shift: &Shift) -> bool {
    shift.employee.is_some()
}

impl Scheduling {
    pub fn new(config: NetworkConfig) -> Result<Self> {
        let workload = RecordingLifecycle::new();
        let idle = RecordingLifecycle::new();

        let group = shared(GroupNode::keyed(
            |a: &Assignment| a.1.id,
            sum(|a: &Assignment| a.0.duration()),
            GroupStores {
                group: 1,
                undo: 2,
                output_size: 0,
            },
            workload.boxed(),
        ));
        let join = shared(
            JoinNode::new(
                equal_bi(|s: &Shift| s.employee, |e: &Employee| Some(e.id)),
                JoinStores {
                    left: 0,
                    right: 0,
                    output: 0,
                    output_size: 3,
                },
                of_node::<Assignment, _>(&group),
            )
            .with_filtering(filtering(|s: &Shift, _: &Employee| s.duration() > 0)),
        );
        let filter = shared(FilterNode::new(assigned, 0, 1, of_left(&join)));
        let if_not_exists = shared(IfExistsNode::if_not_exists(
            equal_bi(|e: &Employee| Some(e.id), |s: &Shift| s.employee),
            IfExistsStores { left: 1, right: 1 },
            idle.boxed(),
        ));
        let shifts = shared(ForEachNode::new(
            2,
            Box::new(AggregatedTupleLifecycle::new(vec![
                of_node(&filter),
                of_right(&if_not_exists),
            ])),
        ));
        let employees = shared(ForEachNode::new(
            2,
            Box::new(AggregatedTupleLifecycle::new(vec![
                of_right(&join),
                of_left(&if_not_exists),
            ])),
        ));

        let mut network = Network::new(config);
        network.add(0, &shifts)?;
        network.add(0, &employees)?;
        network.add(1, &filter)?;
        network.add(1, &if_not_exists)?;
        network.add(2, &join)?;
        network.add(3, &group)?;

        Ok(Self {
            network,
            shifts,
            employees,
            workload,
            idle,
        })
    }
}
