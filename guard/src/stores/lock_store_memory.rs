//! In-memory lock store.

use crate::error::Result;
use crate::providers::LockStore;
use crate::state::{AccountLockState, Identifier};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Lock store backed by a shared `HashMap`.
///
/// Clones share the same map, so a new guard built on a clone sees the lock
/// state of the old one, the same way a page reload sees a durable store.
/// Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    entries: Arc<Mutex<HashMap<Identifier, AccountLockState>>>,
}

impl MemoryLockStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LockStore for MemoryLockStore {
    async fn get(&self, identifier: &Identifier) -> Result<Option<AccountLockState>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(identifier).cloned())
    }

    async fn put(&self, identifier: &Identifier, state: &AccountLockState) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(identifier.clone(), state.clone());
        Ok(())
    }

    async fn remove(&self, identifier: &Identifier) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(identifier);
        Ok(())
    }
}
