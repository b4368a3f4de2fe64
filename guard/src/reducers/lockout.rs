//! Lockout reducer.
//!
//! Implements the per-account state machine:
//!
//! ```text
//!            failure (count < threshold)
//!   OPEN ───────────────────────────────▶ WARNING ──┐ failure (count < threshold)
//!    ▲  ▲                                  │  ▲     │
//!    │  └──────────── success ─────────────┘  └─────┘
//!    │                                     │
//!    │ now >= locked_until                 │ failure (count == threshold)
//!    │                                     ▼
//!    └──────────────────────────────────  LOCKED  (attempts rejected, no mutation)
//! ```
//!
//! Expiry is lazy: it is evaluated at the start of every action using the
//! environment's clock, never by a timer.

use crate::actions::LockoutAction;
use crate::config::GuardConfig;
use crate::effects::LockoutEffect;
use crate::state::{AccountLockState, LockStatus};
use chrono::Duration;
use login_guard_core::environment::Clock;
use login_guard_core::reducer::{Effects, Reducer};
use smallvec::smallvec;
use std::sync::Arc;

/// Lockout policy as a pure reducer.
#[derive(Debug, Clone)]
pub struct LockoutReducer {
    threshold: u32,
    lockout_duration: Duration,
}

impl LockoutReducer {
    /// Build the reducer from the policy half of `config`.
    #[must_use]
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            threshold: config.threshold.max(1),
            lockout_duration: config.lockout_duration(),
        }
    }

    /// Failures before lock.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// The UI view of `state` at the clock's current time.
    ///
    /// Does not apply expiry; an expired lock simply reads as `Open`.
    #[must_use]
    pub fn status(&self, state: &AccountLockState, clock: &dyn Clock) -> LockStatus {
        let now = clock.now();
        match state.locked_until {
            Some(locked_until) if now < locked_until => LockStatus::Locked {
                retry_after_seconds: state.retry_after_seconds(now),
                locked_until,
            },
            Some(_) => LockStatus::Open,
            None if state.failed_count == 0 => LockStatus::Open,
            None => LockStatus::Warning {
                failed_count: state.failed_count,
                remaining_attempts: self.threshold.saturating_sub(state.failed_count),
            },
        }
    }
}

impl Reducer for LockoutReducer {
    type State = AccountLockState;
    type Action = LockoutAction;
    type Environment = Arc<dyn Clock>;
    type Effect = LockoutEffect;

    fn reduce(
        &self,
        state: &mut AccountLockState,
        action: LockoutAction,
        clock: &Arc<dyn Clock>,
    ) -> Effects<LockoutEffect> {
        let now = clock.now();

        let expired = state.lock_expired_at(now);
        if expired {
            tracing::debug!(
                key = %state.identifier,
                failed_count = state.failed_count,
                "Lockout expired, resetting"
            );
            state.failed_count = 0;
            state.locked_until = None;
        }

        match action {
            LockoutAction::Observe => {
                if expired {
                    smallvec![LockoutEffect::Forget(state.identifier.clone())]
                } else {
                    smallvec![]
                }
            }

            LockoutAction::RecordSuccess | LockoutAction::Reset => {
                let had_state = !state.is_default();
                state.failed_count = 0;
                state.locked_until = None;

                if had_state || expired {
                    smallvec![LockoutEffect::Forget(state.identifier.clone())]
                } else {
                    smallvec![]
                }
            }

            LockoutAction::RecordFailure => {
                if state.is_locked_at(now) {
                    // Only reachable if a caller ignored a Denied permit.
                    tracing::warn!(
                        key = %state.identifier,
                        "Failure recorded while locked, ignoring"
                    );
                    return smallvec![];
                }

                state.failed_count = state.failed_count.saturating_add(1);

                if state.failed_count >= self.threshold {
                    state.failed_count = self.threshold;
                    state.locked_until = Some(
                        now.checked_add_signed(self.lockout_duration)
                            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC),
                    );

                    tracing::warn!(
                        lockout_engaged = true,
                        key = %state.identifier,
                        failed_count = state.failed_count,
                        threshold = self.threshold,
                        lockout_seconds = self.lockout_duration.num_seconds(),
                        "Account locked after repeated failures"
                    );
                } else {
                    tracing::debug!(
                        key = %state.identifier,
                        failed_count = state.failed_count,
                        threshold = self.threshold,
                        "Failed attempt recorded"
                    );
                }

                smallvec![LockoutEffect::Persist(state.clone())]
            }
        }
    }
}
