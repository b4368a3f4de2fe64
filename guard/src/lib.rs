//! # Login Guard
//!
//! Brute-force protection for password logins against a hosted identity
//! provider.
//!
//! ## Features
//!
//! - **Lockout**: three consecutive failures lock an account for fifteen
//!   minutes (both configurable)
//! - **Lazy expiry**: locks clear on the next query, no background timers
//! - **Input filter**: denylist pre-check before anything reaches the provider
//! - **Serialized submissions**: one in-flight attempt per account
//! - **Durable state**: optional `Redis` lock store
//! - **Testable**: the lockout policy is a pure reducer over an injected clock
//!
//! ## Architecture
//!
//! The lockout policy is implemented as a reducer and effects:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution (lock store)
//! ```
//!
//! [`LockoutGuard`] is the imperative shell around the reducer and
//! [`LoginFlow`] is the caller contract the UI uses:
//!
//! ```text
//! login(email, secret)
//!   → input filter     (InputRejected, not counted)
//!   → permit           (Locked { retry_after_seconds }, not dispatched)
//!   → authenticate     (identity provider)
//!   → record_result    (AuthenticationFailed, counted)
//! ```
//!
//! ## Example
//!
//! ```
//! use login_guard::mocks::MockIdentityProvider;
//! use login_guard::{GuardConfig, GuardError, LockoutGuard, LoginFlow};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let guard = Arc::new(LockoutGuard::in_memory(GuardConfig::default())?);
//! let flow = LoginFlow::new(guard, MockIdentityProvider::new());
//!
//! for _ in 0..3 {
//!     let _ = flow.login("someone@example.com", "guess").await;
//! }
//!
//! assert!(matches!(
//!     flow.login("someone@example.com", "guess").await,
//!     Err(GuardError::Locked { retry_after_seconds: 900 })
//! ));
//! # Ok::<(), GuardError>(())
//! # }).unwrap();
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod countdown;
pub mod effects;
pub mod error;
pub mod guard;
pub mod input;
pub mod login;
pub mod providers;
pub mod reducers;
pub mod state;
pub mod stores;

// Mock implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::LockoutAction;
pub use config::GuardConfig;
pub use countdown::LockCountdown;
pub use effects::LockoutEffect;
pub use error::{GuardError, ProviderError, Result};
pub use guard::{AttemptSlot, LockoutGuard};
pub use input::InputFilter;
pub use login::LoginFlow;
pub use reducers::LockoutReducer;
pub use state::{
    AccountLockState, AttemptOutcome, Identifier, LockSnapshot, LockStatus, Permit, Principal,
    Session, SessionId, UserId,
};
