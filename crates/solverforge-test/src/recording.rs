//! A terminal consumer that records what reaches it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use solverforge_core::{
    tuple_identity, BoxedLifecycle, Result, SolverForgeError, TupleLifecycle, TupleRef, TupleState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Insert,
    Update,
    Retract,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<F> {
    pub kind: EventKind,
    /// Facts of the tuple at the time of the call.
    pub facts: F,
    /// Identity of the tuple, see [`tuple_identity`].
    pub tuple: usize,
}

struct Log<F> {
    events: Vec<Event<F>>,
    live: HashMap<usize, F>,
}

/// Records every insert/update/retract together with the tuple identity
/// and a snapshot of its facts, and keeps the set of live tuples.
///
/// Clones share one log, so a test can hand a boxed clone to a node and keep
/// the original for assertions. Inserting a live tuple or updating/retracting
/// an unknown one fails, like it would in a real scorer.
pub struct RecordingLifecycle<F> {
    log: Rc<RefCell<Log<F>>>,
}

impl<F: Clone + 'static> RecordingLifecycle<F> {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Log {
                events: Vec::new(),
                live: HashMap::new(),
            })),
        }
    }

    /// A boxed handle sharing this log, for use as a node's consumer.
    pub fn boxed(&self) -> BoxedLifecycle<F> {
        Box::new(self.clone())
    }

    pub fn events(&self) -> Vec<Event<F>> {
        self.log.borrow().events.clone()
    }

    /// Returns the recorded events and forgets them. The live set is kept.
    pub fn take_events(&self) -> Vec<Event<F>> {
        std::mem::take(&mut self.log.borrow_mut().events)
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.log.borrow().events.iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.log
            .borrow()
            .events
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Number of tuples inserted and not yet retracted.
    pub fn live_count(&self) -> usize {
        self.log.borrow().live.len()
    }

    /// Latest facts of every live tuple, in no particular order.
    pub fn live_facts(&self) -> Vec<F> {
        self.log.borrow().live.values().cloned().collect()
    }

    pub fn is_live(&self, tuple: &TupleRef<F>) -> bool {
        self.log.borrow().live.contains_key(&tuple_identity(tuple))
    }

    /// Returns true if the events form retracts, then updates, then inserts.
    pub fn is_phase_ordered(events: &[Event<F>]) -> bool {
        let rank = |kind: EventKind| match kind {
            EventKind::Retract => 0,
            EventKind::Update => 1,
            EventKind::Insert => 2,
        };
        events
            .windows(2)
            .all(|pair| rank(pair[0].kind) <= rank(pair[1].kind))
    }

    fn record(&self, kind: EventKind, tuple: &TupleRef<F>) -> Result<()> {
        let identity = tuple_identity(tuple);
        let facts = tuple.facts().clone();
        let mut log = self.log.borrow_mut();
        match kind {
            EventKind::Insert => {
                if log.live.insert(identity, facts.clone()).is_some() {
                    return Err(SolverForgeError::DuplicateInsert {
                        node: "RecordingLifecycle",
                    });
                }
            }
            EventKind::Update => match log.live.get_mut(&identity) {
                Some(live) => *live = facts.clone(),
                None => return Err(unknown(tuple, "update")),
            },
            EventKind::Retract => {
                if log.live.remove(&identity).is_none() {
                    return Err(unknown(tuple, "retract"));
                }
            }
        }
        log.events.push(Event {
            kind,
            facts,
            tuple: identity,
        });
        Ok(())
    }
}

fn unknown<F>(tuple: &TupleRef<F>, action: &'static str) -> SolverForgeError {
    let state: TupleState = tuple.state();
    SolverForgeError::impossible("RecordingLifecycle", state, action)
}

impl<F: Clone + 'static> Default for RecordingLifecycle<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Clone for RecordingLifecycle<F> {
    fn clone(&self) -> Self {
        Self {
            log: Rc::clone(&self.log),
        }
    }
}

impl<F: Clone + 'static> TupleLifecycle<F> for RecordingLifecycle<F> {
    fn insert(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.record(EventKind::Insert, tuple)
    }

    fn update(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.record(EventKind::Update, tuple)
    }

    fn retract(&mut self, tuple: &TupleRef<F>) -> Result<()> {
        self.record(EventKind::Retract, tuple)
    }
}
