//! Lock state types.
//!
//! This module defines the per-account lock state owned by the guard and the
//! read-only views of it handed to callers. All types are `Clone` so the
//! reducer can work on owned copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Normalized account key (typically an email address).
///
/// Construction trims surrounding whitespace and lowercases, so the same
/// account cannot dodge its lockout through case variation.
///
/// # Examples
///
/// ```
/// # use login_guard::Identifier;
/// assert_eq!(Identifier::new("  Alice@Example.COM "), Identifier::new("alice@example.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Normalize `raw` into an identifier.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// The normalized key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identifier {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a user at the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Generate a new random `SessionId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Lock State
// ═══════════════════════════════════════════════════════════════════════

/// Lock state for one account.
///
/// `failed_count` counts consecutive failures since the last success or
/// lockout expiry. `locked_until` is set exactly when `failed_count`
/// reaches the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLockState {
    /// Account key.
    pub identifier: Identifier,

    /// Consecutive failed attempts.
    pub failed_count: u32,

    /// End of the current lockout, if any.
    pub locked_until: Option<DateTime<Utc>>,
}

impl AccountLockState {
    /// Fresh state for `identifier`: no failures, no lock.
    #[must_use]
    pub const fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            failed_count: 0,
            locked_until: None,
        }
    }

    /// `true` while the lock deadline is still ahead of `now`.
    #[must_use]
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// `true` once a lock has been set and `now` has reached it.
    #[must_use]
    pub fn lock_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now >= until)
    }

    /// `true` when the entry carries no information and can be forgotten.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.failed_count == 0 && self.locked_until.is_none()
    }

    /// Whole seconds until the lock lifts, rounded up. Zero when unlocked.
    #[must_use]
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> u64 {
        match self.locked_until {
            Some(until) if now < until => {
                let remaining = until - now;
                let secs = remaining.num_seconds();
                let rounded = if remaining > chrono::Duration::seconds(secs) {
                    secs + 1
                } else {
                    secs
                };
                u64::try_from(rounded).unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// The caller-facing view of this state.
    #[must_use]
    pub const fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            failed_count: self.failed_count,
            locked_until: self.locked_until,
        }
    }
}

/// Counter and deadline returned by `record_result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSnapshot {
    /// Consecutive failed attempts.
    pub failed_count: u32,

    /// End of the current lockout, if any.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Result of a `permit` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permit {
    /// The attempt may be dispatched.
    Allowed,

    /// The account is locked; do not contact the identity provider.
    Denied {
        /// Whole seconds until the lock expires (rounded up).
        retry_after_seconds: u64,
    },
}

impl Permit {
    /// `true` for [`Permit::Allowed`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Seconds to wait; zero when allowed.
    #[must_use]
    pub const fn retry_after_seconds(&self) -> u64 {
        match self {
            Self::Allowed => 0,
            Self::Denied {
                retry_after_seconds,
            } => *retry_after_seconds,
        }
    }
}

/// Outcome of an authentication attempt that was actually dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The identity provider accepted the credentials.
    Success,

    /// The identity provider refused the credentials (or failed).
    Failure,
}

impl From<bool> for AttemptOutcome {
    fn from(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }
}

/// Lock state as the UI sees it.
///
/// `Warning` is behaviorally identical to `Open` for permission purposes; it
/// only exists so the UI can show "2/3 failed attempts".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStatus {
    /// No failures on record.
    Open,

    /// Some failures, still below the threshold.
    Warning {
        /// Consecutive failed attempts.
        failed_count: u32,
        /// Failures left before the account locks.
        remaining_attempts: u32,
    },

    /// Locked until `locked_until`.
    Locked {
        /// Whole seconds until the lock expires (rounded up).
        retry_after_seconds: u64,
        /// End of the lockout.
        locked_until: DateTime<Utc>,
    },
}

impl LockStatus {
    /// `true` for [`LockStatus::Locked`].
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Identity Types
// ═══════════════════════════════════════════════════════════════════════

/// The authenticated user returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Provider-side user ID.
    pub user_id: UserId,

    /// Account email.
    pub email: String,

    /// Previous successful sign-in, shown on the profile page.
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// An active session at the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub session_id: SessionId,

    /// Signed-in user.
    pub principal: Principal,

    /// Session creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Session expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// `true` while `now` is before `expires_at`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
