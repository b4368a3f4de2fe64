//! # Login Guard Core
//!
//! Core traits shared by the login guard crates.
//!
//! ## Core Concepts
//!
//! - **State**: per-account lock state owned by the guard
//! - **Action**: every input that can change that state
//! - **Reducer**: pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: side effect descriptions (persist, forget), not execution
//! - **Environment**: injected dependencies, at minimum a [`environment::Clock`]
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Explicit Effects (no hidden I/O)
//! - Time is an injected dependency, never read from a global
//!
//! ## Example
//!
//! ```
//! use login_guard_core::reducer::{Effects, Reducer};
//! use smallvec::smallvec;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Counter {
//!     count: u32,
//! }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum CounterEffect {
//!     Saved(u32),
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = Counter;
//!     type Action = ();
//!     type Environment = ();
//!     type Effect = CounterEffect;
//!
//!     fn reduce(&self, state: &mut Counter, _action: (), _env: &()) -> Effects<CounterEffect> {
//!         state.count += 1;
//!         smallvec![CounterEffect::Saved(state.count)]
//!     }
//! }
//!
//! let mut state = Counter::default();
//! let effects = CounterReducer.reduce(&mut state, (), &());
//! assert_eq!(state.count, 1);
//! assert_eq!(effects.as_slice(), &[CounterEffect::Saved(1)]);
//! ```

pub use chrono::{DateTime, Utc};

/// Reducer module - the core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use smallvec::SmallVec;

    /// Effects returned by a single `reduce` call.
    ///
    /// Most transitions produce zero or one effect, so the list lives inline.
    pub type Effects<E> = SmallVec<[E; 2]>;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    /// - `Effect`: The side effect descriptions the shell must execute
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// The effect type describing work for the imperative shell
        type Effect;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Effect>;
    }
}

/// Environment module - dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Production code uses [`SystemClock`]; tests use a clock they can
    /// move forward by hand.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}
