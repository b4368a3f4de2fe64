//! Mock lock store with failure injection.

use crate::error::{GuardError, Result};
use crate::providers::LockStore;
use crate::state::{AccountLockState, Identifier};
use crate::stores::MemoryLockStore;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Lock store that can be told to fail or to be slow.
///
/// Wraps a [`MemoryLockStore`]; clones share entries, switches and counters.
/// With a latency set, every call sleeps first, so concurrent callers
/// interleave the way they would against a remote store.
#[derive(Debug, Clone, Default)]
pub struct MockLockStore {
    inner: MemoryLockStore,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    latency: Option<std::time::Duration>,
}

impl MockLockStore {
    /// Create an empty, healthy store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `latency` at the start of every call.
    #[must_use]
    pub const fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make `get` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `put` and `remove` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `get` calls, failed ones included.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `put` and `remove` calls, failed ones included.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn write_check(&self) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GuardError::PersistenceUnavailable(
                "mock store write failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl LockStore for MockLockStore {
    fn get(
        &self,
        identifier: &Identifier,
    ) -> impl Future<Output = Result<Option<AccountLockState>>> + Send {
        let store = self.clone();
        let id = identifier.clone();

        async move {
            store.delay().await;
            store.reads.fetch_add(1, Ordering::SeqCst);
            if store.fail_reads.load(Ordering::SeqCst) {
                return Err(GuardError::PersistenceUnavailable(
                    "mock store read failure".to_string(),
                ));
            }
            store.inner.get(&id).await
        }
    }

    fn put(
        &self,
        identifier: &Identifier,
        state: &AccountLockState,
    ) -> impl Future<Output = Result<()>> + Send {
        let store = self.clone();
        let id = identifier.clone();
        let state = state.clone();

        async move {
            store.delay().await;
            store.write_check()?;
            store.inner.put(&id, &state).await
        }
    }

    fn remove(&self, identifier: &Identifier) -> impl Future<Output = Result<()>> + Send {
        let store = self.clone();
        let id = identifier.clone();

        async move {
            store.delay().await;
            store.write_check()?;
            store.inner.remove(&id).await
        }
    }
}
