//! Mock provider implementations for testing.
//!
//! In-memory implementations of the provider traits with failure injection,
//! for use in unit and integration tests.

pub mod identity;
pub mod lock_store;

pub use identity::MockIdentityProvider;
pub use lock_store::MockLockStore;
