//! Password login through the lockout guard.
//!
//! [`LoginFlow`] is the one caller of the guard that the UI talks to. Every
//! submission follows the same order:
//!
//! ```text
//! input filter → submission slot → permit → authenticate → record_result
//! ```
//!
//! The submission slot is the guard's per-identifier [`AttemptSlot`]. A
//! second submission for the same identifier waits until the first has
//! recorded its result, so the provider never sees two concurrent attempts
//! for one account, even from flows sharing one guard. Submissions for
//! different identifiers do not wait on each other.
//!
//! [`AttemptSlot`]: crate::guard::AttemptSlot

use crate::countdown::LockCountdown;
use crate::error::{GuardError, Result};
use crate::guard::LockoutGuard;
use crate::providers::{IdentityProvider, LockStore};
use crate::state::{AttemptOutcome, Identifier, LockStatus, Permit, Principal, Session};
use std::sync::Arc;
use std::time::Duration;

/// Login, registration and session calls guarded by lockout and the input
/// filter.
///
/// # Example
///
/// ```
/// use login_guard::mocks::MockIdentityProvider;
/// use login_guard::{GuardConfig, GuardError, LockoutGuard, LoginFlow};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let provider = MockIdentityProvider::new().with_account("test@test.com", "Test123!");
/// let guard = Arc::new(LockoutGuard::in_memory(GuardConfig::default())?);
/// let flow = LoginFlow::new(guard, provider);
///
/// assert!(matches!(
///     flow.login("test@test.com", "wrong").await,
///     Err(GuardError::AuthenticationFailed)
/// ));
/// let principal = flow.login("test@test.com", "Test123!").await?;
/// assert_eq!(principal.email, "test@test.com");
/// # Ok::<(), GuardError>(())
/// # }).unwrap();
/// ```
pub struct LoginFlow<P: IdentityProvider, S: LockStore> {
    guard: Arc<LockoutGuard<S>>,
    provider: P,
}

impl<P: IdentityProvider, S: LockStore> LoginFlow<P, S> {
    /// Wire a provider behind `guard`.
    pub fn new(guard: Arc<LockoutGuard<S>>, provider: P) -> Self {
        Self { guard, provider }
    }

    /// The guard this flow reports to.
    #[must_use]
    pub const fn guard(&self) -> &Arc<LockoutGuard<S>> {
        &self.guard
    }

    /// The wrapped identity provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Sign in with `email` and `secret`.
    ///
    /// # Errors
    ///
    /// - `GuardError::InputRejected` if either value matches the denylist
    ///   (not dispatched, not counted)
    /// - `GuardError::Locked` while the account is locked (not dispatched)
    /// - `GuardError::AuthenticationFailed` for any provider failure (counted)
    pub async fn login(&self, email: &str, secret: &str) -> Result<Principal> {
        self.check_input(email, secret)?;

        let slot = self.guard.acquire(email).await;
        let id = slot.identifier();

        if let Permit::Denied {
            retry_after_seconds,
        } = slot.permit().await
        {
            return Err(GuardError::Locked {
                retry_after_seconds,
            });
        }

        match self.provider.authenticate(id, secret).await {
            Ok(principal) => {
                slot.record_result(AttemptOutcome::Success).await;
                tracing::info!(key = %id, "Login succeeded");
                Ok(principal)
            }
            Err(e) => {
                let snapshot = slot.record_result(AttemptOutcome::Failure).await;
                tracing::info!(
                    key = %id,
                    error = %e,
                    failed_count = snapshot.failed_count,
                    locked = snapshot.locked_until.is_some(),
                    "Login failed"
                );
                Err(GuardError::AuthenticationFailed)
            }
        }
    }

    /// Create an account. Never touches lock state.
    ///
    /// # Errors
    ///
    /// - `GuardError::InputRejected` if either value matches the denylist
    /// - `GuardError::Provider` if the provider refuses the sign-up
    pub async fn register(&self, email: &str, secret: &str) -> Result<Principal> {
        self.check_input(email, secret)?;

        let id = Identifier::new(email);
        let principal = self.provider.sign_up(&id, secret).await.map_err(|e| {
            tracing::info!(key = %id, error = %e, "Sign-up refused");
            GuardError::from(e)
        })?;

        tracing::info!(key = %id, user_id = %principal.user_id.0, "Account registered");
        Ok(principal)
    }

    /// The signed-in user's session, if any.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Provider` if the provider call fails.
    pub async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.provider.current_session().await?)
    }

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Provider` if the provider call fails.
    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        tracing::debug!("Signed out");
        Ok(())
    }

    /// Lock status for `email`.
    pub async fn status(&self, email: &str) -> LockStatus {
        self.guard.status(email).await
    }

    /// Ticker for the remaining lock time of `email`.
    pub async fn countdown(&self, email: &str, tick: Duration) -> LockCountdown
    where
        S: 'static,
    {
        LockCountdown::start(Arc::clone(&self.guard), email, tick).await
    }

    fn check_input(&self, email: &str, secret: &str) -> Result<()> {
        if self.guard.input_is_well_formed(email) && self.guard.input_is_well_formed(secret) {
            return Ok(());
        }
        // Never log the submitted values.
        tracing::warn!(security_event = true, "Submission rejected by input filter");
        Err(GuardError::InputRejected)
    }
}

impl<P: IdentityProvider, S: LockStore> std::fmt::Debug for LoginFlow<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFlow")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;
    use crate::mocks::MockIdentityProvider;
    use crate::stores::MemoryLockStore;
    use login_guard_testing::ManualClock;

    fn flow(clock: &ManualClock) -> LoginFlow<MockIdentityProvider, MemoryLockStore> {
        let guard =
            LockoutGuard::new(GuardConfig::default(), MemoryLockStore::new(), clock.clone())
                .unwrap();
        let provider = MockIdentityProvider::new().with_account("test@test.com", "Test123!");
        LoginFlow::new(Arc::new(guard), provider)
    }

    #[tokio::test]
    async fn test_rejected_input_is_not_counted() {
        let flow = flow(&ManualClock::default());

        let err = flow.login("test@test.com", "' OR '1'='1").await.unwrap_err();
        assert_eq!(err, GuardError::InputRejected);
        assert_eq!(flow.provider().authenticate_calls(), 0);
        assert_eq!(flow.status("test@test.com").await, LockStatus::Open);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let flow = flow(&ManualClock::default());

        let wrong = flow.login("test@test.com", "wrong").await.unwrap_err();
        let unknown = flow.login("ghost@test.com", "wrong").await.unwrap_err();
        assert_eq!(wrong, unknown);
        assert_eq!(wrong.user_message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_locked_account_is_not_dispatched() {
        let flow = flow(&ManualClock::default());

        for _ in 0..3 {
            assert_eq!(
                flow.login("test@test.com", "wrong").await.unwrap_err(),
                GuardError::AuthenticationFailed
            );
        }
        let calls = flow.provider().authenticate_calls();

        let err = flow.login("test@test.com", "Test123!").await.unwrap_err();
        assert_eq!(
            err,
            GuardError::Locked {
                retry_after_seconds: 900
            }
        );
        assert_eq!(flow.provider().authenticate_calls(), calls);
    }

    #[tokio::test]
    async fn test_network_failure_counts_as_failure() {
        let flow = flow(&ManualClock::default());
        flow.provider().set_network_down(true);

        let err = flow.login("test@test.com", "Test123!").await.unwrap_err();
        assert_eq!(err, GuardError::AuthenticationFailed);
        assert_eq!(
            flow.status("test@test.com").await,
            LockStatus::Warning {
                failed_count: 1,
                remaining_attempts: 2
            }
        );
    }

    #[tokio::test]
    async fn test_register_never_touches_lock_state() {
        let flow = flow(&ManualClock::default());

        flow.register("new@test.com", "secret1").await.unwrap();
        let err = flow.register("new@test.com", "secret1").await.unwrap_err();
        assert!(matches!(err, GuardError::Provider(_)));

        assert_eq!(flow.guard().tracked_accounts(), 0);
        assert!(flow.login("NEW@test.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn test_session_pass_through() {
        let flow = flow(&ManualClock::default());
        assert!(flow.current_session().await.unwrap().is_none());

        flow.login("test@test.com", "Test123!").await.unwrap();
        let session = flow.current_session().await.unwrap().unwrap();
        assert_eq!(session.principal.email, "test@test.com");

        flow.sign_out().await.unwrap();
        assert!(flow.current_session().await.unwrap().is_none());

        flow.provider().set_network_down(true);
        assert!(matches!(
            flow.sign_out().await.unwrap_err(),
            GuardError::Provider(_)
        ));
    }

    #[tokio::test]
    async fn test_slots_are_released() {
        let flow = flow(&ManualClock::default());
        flow.login("test@test.com", "wrong").await.unwrap_err();
        flow.login("test@test.com", "Test123!").await.unwrap();
        assert_eq!(flow.guard().open_slots(), 0);
    }
}
