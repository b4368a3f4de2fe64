//! The lockout guard.
//!
//! The guard is the imperative shell around [`LockoutReducer`]: it owns the
//! per-account state table, reads the lock store before deciding, runs the
//! reducer, and writes the resulting effects back to the store.
//!
//! # Failure semantics
//!
//! The guard cannot fail. Store reads that error fall back to the in-memory
//! table; store writes that error are logged and the in-memory decision is
//! returned unchanged. An identifier whose last write failed is read from
//! the in-memory table until a later write succeeds, so a stale store entry
//! never undoes a lock.
//!
//! # Serialization
//!
//! Every state transition for an identifier runs while holding that
//! identifier's [`AttemptSlot`], an async mutex kept for the whole
//! load → reduce → write sequence. Callers that dispatch to an identity
//! provider hold the slot across `permit → authenticate → record_result`
//! via [`LockoutGuard::acquire`], so at most one attempt per identifier is
//! ever in flight, whichever caller submitted it.

use crate::actions::LockoutAction;
use crate::config::GuardConfig;
use crate::effects::LockoutEffect;
use crate::error::{GuardError, Result};
use crate::input::InputFilter;
use crate::providers::LockStore;
use crate::reducers::LockoutReducer;
use crate::state::{AccountLockState, AttemptOutcome, Identifier, LockSnapshot, LockStatus, Permit};
use crate::stores::MemoryLockStore;
use login_guard_core::environment::{Clock, SystemClock};
use login_guard_core::reducer::{Effects, Reducer};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Attempt tracker and lockout enforcer.
///
/// # Example
///
/// ```
/// use login_guard::{AttemptOutcome, GuardConfig, LockoutGuard, Permit};
///
/// # tokio_test::block_on(async {
/// let guard = LockoutGuard::in_memory(GuardConfig::default())?;
///
/// for _ in 0..3 {
///     assert!(guard.permit("user@example.com").await.is_allowed());
///     guard.record_result("user@example.com", AttemptOutcome::Failure).await;
/// }
///
/// assert!(matches!(guard.permit("USER@example.com").await, Permit::Denied { .. }));
/// # Ok::<(), login_guard::GuardError>(())
/// # }).unwrap();
/// ```
pub struct LockoutGuard<S: LockStore> {
    reducer: LockoutReducer,
    filter: InputFilter,
    store: S,
    persistence_enabled: bool,
    clock: Arc<dyn Clock>,
    table: Mutex<HashMap<Identifier, AccountLockState>>,
    unsynced: Mutex<HashSet<Identifier>>,
    slots: Mutex<HashMap<Identifier, Slot>>,
}

impl LockoutGuard<MemoryLockStore> {
    /// Guard without durable storage, using the system clock.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::InvalidConfig` if `config` fails validation or a
    /// denylist pattern does not compile.
    pub fn in_memory(config: GuardConfig) -> Result<Self> {
        Self::new(config.with_persistence(false), MemoryLockStore::new(), SystemClock)
    }
}

impl<S: LockStore> LockoutGuard<S> {
    /// Create a guard.
    ///
    /// `store` is only consulted when `config.persistence_enabled` is set.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::InvalidConfig` if `config` fails validation or a
    /// denylist pattern does not compile.
    pub fn new(config: GuardConfig, store: S, clock: impl Clock + 'static) -> Result<Self> {
        config.validate()?;
        let filter = InputFilter::new(&config.denylist_patterns)?;

        tracing::debug!(
            threshold = config.threshold,
            lockout_seconds = config.lockout_duration_seconds,
            denylist_patterns = filter.len(),
            persistence = config.persistence_enabled,
            "Lockout guard configured"
        );

        Ok(Self {
            reducer: LockoutReducer::new(&config),
            filter,
            store,
            persistence_enabled: config.persistence_enabled,
            clock: Arc::new(clock),
            table: Mutex::new(HashMap::new()),
            unsynced: Mutex::new(HashSet::new()),
            slots: Mutex::new(HashMap::new()),
        })
    }

    /// Take the exclusive slot for `identifier`.
    ///
    /// Waits while another caller holds it. The slot is released when the
    /// returned value is dropped.
    pub async fn acquire(&self, identifier: &str) -> AttemptSlot<'_, S> {
        let id = Identifier::new(identifier);
        let slot = {
            let mut slots = self.slots();
            Arc::clone(slots.entry(id.clone()).or_default())
        };
        let held = slot.lock_owned().await;

        AttemptSlot {
            guard: self,
            id,
            held: Some(held),
        }
    }

    /// Decide whether an attempt for `identifier` may be dispatched.
    ///
    /// Never contacts the identity provider. Applies lazy lock expiry.
    pub async fn permit(&self, identifier: &str) -> Permit {
        self.acquire(identifier).await.permit().await
    }

    /// Record the outcome of a dispatched attempt.
    ///
    /// Must be called exactly once per attempt that `permit` allowed.
    pub async fn record_result(
        &self,
        identifier: &str,
        outcome: impl Into<AttemptOutcome>,
    ) -> LockSnapshot {
        self.acquire(identifier).await.record_result(outcome).await
    }

    /// Lock status for UI feedback. Applies lazy lock expiry.
    pub async fn status(&self, identifier: &str) -> LockStatus {
        let slot = self.acquire(identifier).await;
        let state = self.apply(&slot.id, LockoutAction::Observe).await;
        self.reducer.status(&state, self.clock.as_ref())
    }

    /// Lock status without any state transition or store write.
    ///
    /// For display loops (the countdown) that must only read.
    pub async fn peek(&self, identifier: &Identifier) -> LockStatus {
        let state = self.load(identifier).await;
        self.reducer.status(&state, self.clock.as_ref())
    }

    /// Administrative unlock: clear all state for `identifier`.
    pub async fn reset(&self, identifier: &str) -> LockSnapshot {
        let slot = self.acquire(identifier).await;
        let snapshot = self.apply(&slot.id, LockoutAction::Reset).await.snapshot();
        tracing::info!(key = %slot.id, "Lockout reset");
        snapshot
    }

    /// Denylist pre-check. Does not touch lock state.
    #[must_use]
    pub fn input_is_well_formed(&self, value: &str) -> bool {
        self.filter.input_is_well_formed(value)
    }

    /// Failures before lock.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.reducer.threshold()
    }

    /// Number of identifiers with non-default in-memory state.
    #[must_use]
    pub fn tracked_accounts(&self) -> usize {
        self.table().len()
    }

    /// Read-before-decide, reduce, write-after-decide.
    ///
    /// Callers hold the identifier's slot.
    async fn apply(&self, id: &Identifier, action: LockoutAction) -> AccountLockState {
        let mut state = self.load(id).await;

        let effects = {
            let mut table = self.table();
            let effects = self.reducer.reduce(&mut state, action, &self.clock);
            if state.is_default() {
                table.remove(id);
            } else {
                table.insert(id.clone(), state.clone());
            }
            effects
        };

        self.execute(effects).await;
        state
    }

    /// Current state for `id`, preferring the store when persistence is on.
    async fn load(&self, id: &Identifier) -> AccountLockState {
        if self.persistence_enabled && !self.is_unsynced(id) {
            match self.store.get(id).await {
                Ok(Some(state)) => return state,
                Ok(None) => return AccountLockState::new(id.clone()),
                Err(e) => report_persistence_failure(id, &e),
            }
        }

        self.table()
            .get(id)
            .cloned()
            .unwrap_or_else(|| AccountLockState::new(id.clone()))
    }

    async fn execute(&self, effects: Effects<LockoutEffect>) {
        if !self.persistence_enabled {
            return;
        }

        for effect in effects {
            let id = effect.identifier().clone();
            let written = match &effect {
                LockoutEffect::Persist(state) => self.store.put(&id, state).await,
                LockoutEffect::Forget(_) => self.store.remove(&id).await,
            };
            match written {
                Ok(()) => {
                    self.unsynced().remove(&id);
                }
                Err(e) => {
                    self.unsynced().insert(id.clone());
                    report_persistence_failure(&id, &e);
                }
            }
        }
    }

    /// Drop the slot once no other caller holds or waits on it.
    fn release_slot(&self, id: &Identifier) {
        let mut slots = self.slots();
        if slots.get(id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(id);
        }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<Identifier, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn open_slots(&self) -> usize {
        self.slots().len()
    }

    fn is_unsynced(&self, id: &Identifier) -> bool {
        self.unsynced().contains(id)
    }

    /// Identifiers whose last store write failed.
    fn unsynced(&self) -> std::sync::MutexGuard<'_, HashSet<Identifier>> {
        self.unsynced.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<Identifier, AccountLockState>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access to one identifier's lock state.
///
/// Obtained from [`LockoutGuard::acquire`]. While it is alive no other
/// caller can observe or change the identifier's state.
pub struct AttemptSlot<'a, S: LockStore> {
    guard: &'a LockoutGuard<S>,
    id: Identifier,
    held: Option<OwnedMutexGuard<()>>,
}

impl<S: LockStore> AttemptSlot<'_, S> {
    /// The normalized identifier this slot covers.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.id
    }

    /// [`LockoutGuard::permit`] without re-acquiring the slot.
    pub async fn permit(&self) -> Permit {
        let state = self.guard.apply(&self.id, LockoutAction::Observe).await;
        let now = self.guard.clock.now();

        if state.is_locked_at(now) {
            let retry_after_seconds = state.retry_after_seconds(now);
            tracing::debug!(
                key = %self.id,
                retry_after_seconds = retry_after_seconds,
                "Attempt denied, account locked"
            );
            Permit::Denied {
                retry_after_seconds,
            }
        } else {
            Permit::Allowed
        }
    }

    /// [`LockoutGuard::record_result`] without re-acquiring the slot.
    pub async fn record_result(&self, outcome: impl Into<AttemptOutcome>) -> LockSnapshot {
        self.guard
            .apply(&self.id, LockoutAction::from(outcome.into()))
            .await
            .snapshot()
    }
}

impl<S: LockStore> Drop for AttemptSlot<'_, S> {
    fn drop(&mut self) {
        drop(self.held.take());
        self.guard.release_slot(&self.id);
    }
}

impl<S: LockStore> std::fmt::Debug for AttemptSlot<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptSlot")
            .field("identifier", &self.id)
            .finish_non_exhaustive()
    }
}

fn report_persistence_failure(id: &Identifier, err: &GuardError) {
    let err = match err {
        GuardError::PersistenceUnavailable(_) => err.clone(),
        other => GuardError::PersistenceUnavailable(other.to_string()),
    };
    tracing::warn!(
        key = %id,
        error = %err,
        "Lock store unavailable, continuing with in-memory state"
    );
}

impl<S: LockStore> std::fmt::Debug for LockoutGuard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockoutGuard")
            .field("threshold", &self.reducer.threshold())
            .field("persistence_enabled", &self.persistence_enabled)
            .field("tracked_accounts", &self.tracked_accounts())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use login_guard_testing::ManualClock;

    fn guard(clock: &ManualClock) -> LockoutGuard<MemoryLockStore> {
        LockoutGuard::new(GuardConfig::default(), MemoryLockStore::new(), clock.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_three_failures_scenario() {
        let clock = ManualClock::default();
        let guard = guard(&clock);
        let id = "user@example.com";

        let first = guard.record_result(id, AttemptOutcome::Failure).await;
        assert_eq!(first.failed_count, 1);
        assert!(first.locked_until.is_none());

        let second = guard.record_result(id, AttemptOutcome::Failure).await;
        assert_eq!(second.failed_count, 2);
        assert!(second.locked_until.is_none());

        let third = guard.record_result(id, AttemptOutcome::Failure).await;
        assert_eq!(third.failed_count, 3);
        assert_eq!(third.locked_until, Some(clock.now() + Duration::seconds(900)));

        assert_eq!(
            guard.permit(id).await,
            Permit::Denied {
                retry_after_seconds: 900
            }
        );

        clock.advance(Duration::seconds(900));

        assert_eq!(guard.permit(id).await, Permit::Allowed);
        assert_eq!(guard.status(id).await, LockStatus::Open);
        assert_eq!(guard.tracked_accounts(), 0);
    }

    #[tokio::test]
    async fn test_success_resets_count() {
        let clock = ManualClock::default();
        let guard = guard(&clock);
        let id = "user@example.com";

        guard.record_result(id, false).await;
        guard.record_result(id, false).await;
        let reset = guard.record_result(id, true).await;
        assert_eq!(reset.failed_count, 0);
        assert!(reset.locked_until.is_none());

        let next = guard.record_result(id, false).await;
        assert_eq!(next.failed_count, 1);
    }

    #[tokio::test]
    async fn test_case_variants_share_state() {
        let clock = ManualClock::default();
        let guard = guard(&clock);

        guard.record_result("user@example.com", false).await;
        guard.record_result("USER@example.com", false).await;
        guard.record_result("  User@Example.Com  ", false).await;

        assert!(!guard.permit("user@EXAMPLE.com").await.is_allowed());
    }

    #[tokio::test]
    async fn test_status_warning_then_locked() {
        let clock = ManualClock::default();
        let guard = guard(&clock);
        let id = "user@example.com";

        guard.record_result(id, false).await;
        assert_eq!(
            guard.status(id).await,
            LockStatus::Warning {
                failed_count: 1,
                remaining_attempts: 2
            }
        );

        guard.record_result(id, false).await;
        guard.record_result(id, false).await;
        clock.advance(Duration::seconds(100));
        assert!(matches!(
            guard.status(id).await,
            LockStatus::Locked {
                retry_after_seconds: 800,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_reset_unlocks() {
        let clock = ManualClock::default();
        let guard = guard(&clock);
        let id = "user@example.com";

        for _ in 0..3 {
            guard.record_result(id, false).await;
        }
        assert!(!guard.permit(id).await.is_allowed());

        let snapshot = guard.reset(id).await;
        assert_eq!(snapshot.failed_count, 0);
        assert!(guard.permit(id).await.is_allowed());
    }

    #[tokio::test]
    async fn test_persistence_disabled_never_writes_store() {
        let clock = ManualClock::default();
        let store = MemoryLockStore::new();
        let guard =
            LockoutGuard::new(GuardConfig::default(), store.clone(), clock.clone()).unwrap();

        guard.record_result("user@example.com", false).await;

        assert!(store.is_empty());
        assert_eq!(guard.tracked_accounts(), 1);
    }

    #[tokio::test]
    async fn test_peek_does_not_expire() {
        let clock = ManualClock::default();
        let guard = guard(&clock);
        let id = Identifier::new("user@example.com");

        for _ in 0..3 {
            guard.record_result(id.as_str(), false).await;
        }
        clock.advance(Duration::seconds(901));

        assert_eq!(guard.peek(&id).await, LockStatus::Open);
        // peek left the expired entry in place
        assert_eq!(guard.tracked_accounts(), 1);

        guard.status(id.as_str()).await;
        assert_eq!(guard.tracked_accounts(), 0);
    }

    #[tokio::test]
    async fn test_success_clears_active_lock() {
        let clock = ManualClock::default();
        let guard = guard(&clock);
        for _ in 0..3 {
            guard.record_result("a@b.c", false).await;
        }

        let snapshot = guard.record_result("a@b.c", true).await;

        assert_eq!(snapshot.failed_count, 0);
        assert_eq!(snapshot.locked_until, None);
        assert_eq!(guard.permit("a@b.c").await, Permit::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_release_their_slots() {
        let clock = ManualClock::default();
        let store = crate::mocks::MockLockStore::new()
            .with_latency(std::time::Duration::from_millis(1));
        let guard = Arc::new(
            LockoutGuard::new(GuardConfig::new().with_persistence(true), store, clock).unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let guard = Arc::clone(&guard);
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        guard.record_result("a@b.c", false).await;
                    } else {
                        guard.permit("a@b.c").await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(guard.open_slots(), 0);
        assert_eq!(
            guard.status("a@b.c").await,
            LockStatus::Warning {
                failed_count: 2,
                remaining_attempts: 1
            }
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = LockoutGuard::in_memory(GuardConfig::new().with_denylist(["[unclosed"]))
            .unwrap_err();
        assert!(matches!(err, GuardError::InvalidConfig(_)));

        let err = LockoutGuard::in_memory(GuardConfig::new().with_threshold(0)).unwrap_err();
        assert!(matches!(err, GuardError::InvalidConfig(_)));
    }
}
