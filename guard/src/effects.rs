//! Lockout effects.
//!
//! Effects are **values**, not execution. The guard interprets them after
//! the in-memory transition, writing to the lock store when persistence is
//! enabled.

use crate::state::{AccountLockState, Identifier};
use serde::{Deserialize, Serialize};

/// Lockout effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockoutEffect {
    /// Write the new state to the lock store.
    Persist(AccountLockState),

    /// The state returned to default; drop it from the lock store.
    Forget(Identifier),
}

impl LockoutEffect {
    /// Identifier the effect applies to.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        match self {
            Self::Persist(state) => &state.identifier,
            Self::Forget(identifier) => identifier,
        }
    }
}
