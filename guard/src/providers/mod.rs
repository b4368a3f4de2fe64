//! Guard providers.
//!
//! This module defines traits for the external dependencies of the guard.
//! These traits enable dependency injection and make the lockout logic
//! testable.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The guard depends on
//! these traits; the application supplies concrete implementations.
//!
//! ```text
//!   UI ──▶ LoginFlow ──▶ LockoutGuard ──▶ LockStore        (get / put / remove)
//!              │
//!              └───────▶ IdentityProvider                  (authenticate / sign_up /
//!                                                           current_session / sign_out)
//! ```
//!
//! This enables:
//! - **Testing**: Use mocks (in-memory, deterministic, failure injection)
//! - **Production**: Use real services (hosted identity provider, `Redis`)

pub mod identity;
pub mod lock_store;

// Re-export provider traits
pub use identity::{IdentityProvider, ProviderResult};
pub use lock_store::LockStore;
