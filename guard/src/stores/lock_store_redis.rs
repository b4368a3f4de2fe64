//! Redis-based lock store implementation.
//!
//! # Architecture
//!
//! Lock state is stored in Redis with:
//! - **Key**: `login_guard:lock:{identifier}` → JSON-serialized `AccountLockState`
//! - **TTL**: only for locked entries, the remaining lock time plus a small
//!   buffer. Once a lock has expired the lazy transition resets the entry to
//!   default anyway, so letting Redis drop the key is equivalent.
//!   Unlocked counters carry no TTL; they reset only on success or lockout.
//!
//! The TTL is measured against the store's own [`Clock`], the system clock
//! unless [`RedisLockStore::with_clock`] says otherwise. Give it the clock
//! the guard decides with, or expiry in Redis drifts from `locked_until`.
//!
//! # Example
//!
//! ```no_run
//! use login_guard::stores::RedisLockStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisLockStore::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{GuardError, Result};
use crate::providers::LockStore;
use crate::state::{AccountLockState, Identifier};
use chrono::{DateTime, Utc};
use login_guard_core::environment::{Clock, SystemClock};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::sync::Arc;

/// Seconds kept past `locked_until` before Redis evicts a lock entry.
const EXPIRY_BUFFER_SECONDS: u64 = 60;

/// `Redis`-backed lock store.
#[derive(Clone)]
pub struct RedisLockStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    /// Time source for entry TTLs.
    clock: Arc<dyn Clock>,
}

impl RedisLockStore {
    /// Create a new `Redis` lock store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - `Redis` connection URL (e.g., "<redis://127.0.0.1:6379>")
    ///
    /// # Errors
    ///
    /// Returns `GuardError::PersistenceUnavailable` if connection to `Redis` fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            GuardError::PersistenceUnavailable(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            GuardError::PersistenceUnavailable(format!(
                "Failed to create Redis connection manager: {e}"
            ))
        })?;

        Ok(Self {
            conn_manager,
            clock: Arc::new(SystemClock),
        })
    }

    /// Measure TTLs against `clock` instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Get the `Redis` key for an identifier.
    fn lock_key(identifier: &Identifier) -> String {
        format!("login_guard:lock:{identifier}")
    }

    /// TTL for a stored state, `None` for entries that must not expire.
    fn ttl_seconds(state: &AccountLockState, now: DateTime<Utc>) -> Option<u64> {
        let until = state.locked_until?;
        let remaining = (until - now).num_seconds().max(0);
        Some(u64::try_from(remaining).unwrap_or(0) + EXPIRY_BUFFER_SECONDS)
    }
}

impl std::fmt::Debug for RedisLockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLockStore").finish_non_exhaustive()
    }
}

impl LockStore for RedisLockStore {
    async fn get(&self, identifier: &Identifier) -> Result<Option<AccountLockState>> {
        let mut conn = self.conn_manager.clone();
        let key = Self::lock_key(identifier);

        let raw: Option<String> = conn.get(&key).await.map_err(|e| {
            GuardError::PersistenceUnavailable(format!("Failed to read lock state: {e}"))
        })?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let state: AccountLockState = serde_json::from_str(&raw).map_err(|e| {
            GuardError::PersistenceUnavailable(format!("Failed to decode lock state: {e}"))
        })?;

        tracing::debug!(
            key = %identifier,
            failed_count = state.failed_count,
            locked = state.locked_until.is_some(),
            "Loaded lock state from Redis"
        );

        Ok(Some(state))
    }

    async fn put(&self, identifier: &Identifier, state: &AccountLockState) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::lock_key(identifier);

        let value = serde_json::to_string(state).map_err(|e| {
            GuardError::PersistenceUnavailable(format!("Failed to encode lock state: {e}"))
        })?;

        let written: redis::RedisResult<()> = match Self::ttl_seconds(state, self.clock.now()) {
            Some(ttl) => conn.set_ex(&key, value, ttl).await,
            None => conn.set(&key, value).await,
        };

        written.map_err(|e| {
            GuardError::PersistenceUnavailable(format!("Failed to write lock state: {e}"))
        })?;

        tracing::debug!(
            key = %identifier,
            failed_count = state.failed_count,
            "Stored lock state in Redis"
        );

        Ok(())
    }

    async fn remove(&self, identifier: &Identifier) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::lock_key(identifier);

        let _: () = conn.del(&key).await.map_err(|e| {
            GuardError::PersistenceUnavailable(format!("Failed to delete lock state: {e}"))
        })?;

        tracing::debug!(key = %identifier, "Removed lock state from Redis");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // Note: tests marked #[ignore] require a running Redis instance
    // Run with: docker run -d -p 6379:6379 redis:7-alpine

    fn unique_id(prefix: &str) -> Identifier {
        Identifier::new(&format!("{prefix}-{}@example.com", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_lock_key_uses_normalized_identifier() {
        let key = RedisLockStore::lock_key(&Identifier::new(" User@Example.com"));
        assert_eq!(key, "login_guard:lock:user@example.com");
    }

    #[test]
    fn test_ttl_only_for_locked_entries() {
        let now = login_guard_testing::test_clock().now();
        let mut state = AccountLockState::new(Identifier::new("a@b.c"));
        state.failed_count = 2;
        assert_eq!(RedisLockStore::ttl_seconds(&state, now), None);

        state.failed_count = 3;
        state.locked_until = Some(now + Duration::seconds(900));
        assert_eq!(
            RedisLockStore::ttl_seconds(&state, now),
            Some(900 + EXPIRY_BUFFER_SECONDS)
        );

        state.locked_until = Some(now - Duration::seconds(30));
        assert_eq!(
            RedisLockStore::ttl_seconds(&state, now),
            Some(EXPIRY_BUFFER_SECONDS)
        );
    }

    #[test]
    fn test_ttl_follows_injected_time_not_wall_clock() {
        // A lock set against a clock far from the wall clock still gets the
        // full remaining time.
        let clock = login_guard_testing::ManualClock::default();
        clock.advance(Duration::days(3650));
        let now = clock.now();

        let state = AccountLockState {
            failed_count: 3,
            locked_until: Some(now + Duration::seconds(120)),
            ..AccountLockState::new(Identifier::new("a@b.c"))
        };

        assert_eq!(
            RedisLockStore::ttl_seconds(&state, now),
            Some(120 + EXPIRY_BUFFER_SECONDS)
        );
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_put_get_remove() {
        let store = RedisLockStore::new("redis://127.0.0.1:6379").await.unwrap();
        let id = unique_id("roundtrip");
        let state = AccountLockState {
            failed_count: 3,
            locked_until: Some(Utc::now() + Duration::seconds(900)),
            ..AccountLockState::new(id.clone())
        };

        store.put(&id, &state).await.unwrap();
        let loaded = store.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.failed_count, 3);
        assert_eq!(loaded.identifier, id);

        store.remove(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_missing_key_is_none() {
        let store = RedisLockStore::new("redis://127.0.0.1:6379").await.unwrap();
        assert!(store.get(&unique_id("missing")).await.unwrap().is_none());
    }
}
