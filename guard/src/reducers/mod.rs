//! Lockout reducers.
//!
//! Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.

pub mod lockout;

pub use lockout::LockoutReducer;
