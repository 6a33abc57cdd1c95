//! Tuple lifecycle state machine.
//!
//! Every tuple (and every group or exists-counter carrier) is in exactly one
//! of six states. Nodes branch on the current state before mutating a
//! carrier; the transition table below is the single source of truth for
//! which moves are legal.

use std::fmt;

/// Lifecycle state of a tuple or carrier.
///
/// `Creating`/`Updating` mean "about to be (re-)announced downstream",
/// `Dying`/`Aborting` mean "about to be retracted" (the difference being
/// whether the tuple ever reached `Ok`), and `Dead` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TupleState {
    Creating,
    Updating,
    Ok,
    Dying,
    Aborting,
    /// Initial and terminal state. Fresh tuples start here.
    #[default]
    Dead,
}

// Rows: from, columns: to. Order matches `TupleState::ordinal`.
const TRANSITIONS: [[bool; 6]; 6] = [
    // Creating  Updating Ok     Dying  Aborting Dead
    [false, false, true, false, true, false],  // Creating
    [false, false, true, true, false, false],  // Updating
    [false, true, false, true, false, false],  // Ok
    [false, true, false, false, false, true],  // Dying
    [true, false, false, false, false, true],  // Aborting
    [true, false, false, false, false, false], // Dead
];

impl TupleState {
    pub const ALL: [TupleState; 6] = [
        TupleState::Creating,
        TupleState::Updating,
        TupleState::Ok,
        TupleState::Dying,
        TupleState::Aborting,
        TupleState::Dead,
    ];

    #[inline]
    const fn ordinal(self) -> usize {
        match self {
            TupleState::Creating => 0,
            TupleState::Updating => 1,
            TupleState::Ok => 2,
            TupleState::Dying => 3,
            TupleState::Aborting => 4,
            TupleState::Dead => 5,
        }
    }

    /// Returns true if consumers have seen this tuple and it is not scheduled
    /// for any change.
    #[inline]
    pub fn is_active(self) -> bool {
        self == TupleState::Ok
    }

    /// Returns true if the tuple is propagated or about to be (re-)propagated.
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(
            self,
            TupleState::Creating | TupleState::Updating | TupleState::Ok
        )
    }

    /// Returns true if the tuple is waiting in a propagation queue.
    #[inline]
    pub fn is_dirty(self) -> bool {
        !matches!(self, TupleState::Ok | TupleState::Dead)
    }

    /// Returns true if `next` is a legal successor of `self`.
    #[inline]
    pub fn can_transition_to(self, next: TupleState) -> bool {
        TRANSITIONS[self.ordinal()][next.ordinal()]
    }

    /// The retraction state for a live tuple: `Aborting` if it never reached
    /// `Ok`, `Dying` otherwise. `None` if the tuple is not live.
    #[inline]
    pub fn retract_target(self) -> Option<TupleState> {
        match self {
            TupleState::Creating => Some(TupleState::Aborting),
            TupleState::Updating | TupleState::Ok => Some(TupleState::Dying),
            TupleState::Dying | TupleState::Aborting | TupleState::Dead => None,
        }
    }
}

impl fmt::Display for TupleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TupleState::Creating => "CREATING",
            TupleState::Updating => "UPDATING",
            TupleState::Ok => "OK",
            TupleState::Dying => "DYING",
            TupleState::Aborting => "ABORTING",
            TupleState::Dead => "DEAD",
        };
        f.write_str(name)
    }
}
