//! Lockout actions.
//!
//! Every input that can change an account's lock state. Actions are the only
//! way the guard talks to the lockout reducer.

use serde::{Deserialize, Serialize};

/// Lockout action.
///
/// # Architecture Note
///
/// The reducer is a pure function: `(State, Action, Env) → (State, Effects)`.
/// Lazy lock expiry is applied before every action, so even `Observe` can
/// change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockoutAction {
    /// A permit check or status query.
    ///
    /// Applies lazy expiry and nothing else.
    Observe,

    /// A dispatched attempt succeeded.
    RecordSuccess,

    /// A dispatched attempt failed.
    RecordFailure,

    /// Administrative unlock.
    Reset,
}

impl From<crate::state::AttemptOutcome> for LockoutAction {
    fn from(outcome: crate::state::AttemptOutcome) -> Self {
        match outcome {
            crate::state::AttemptOutcome::Success => Self::RecordSuccess,
            crate::state::AttemptOutcome::Failure => Self::RecordFailure,
        }
    }
}
