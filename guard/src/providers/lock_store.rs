//! Lock store trait.

use crate::error::Result;
use crate::state::{AccountLockState, Identifier};

/// Durable per-account lock state.
///
/// This trait abstracts over the key-value store that lets lock state
/// survive restarts (`Redis` in production, in-memory in tests).
///
/// # Implementation Notes
///
/// - Keys are normalized [`Identifier`]s
/// - A missing entry means "default state" (no failures, no lock)
/// - Errors should map to `GuardError::PersistenceUnavailable`; the guard
///   treats them as non-fatal
///
/// # Example
///
/// ```no_run
/// use login_guard::providers::LockStore;
/// use login_guard::{AccountLockState, Identifier};
///
/// # async fn example(store: impl LockStore) -> Result<(), Box<dyn std::error::Error>> {
/// let id = Identifier::new("user@example.com");
/// let state = store.get(&id).await?.unwrap_or_else(|| AccountLockState::new(id.clone()));
/// store.put(&id, &state).await?;
/// # Ok(())
/// # }
/// ```
pub trait LockStore: Send + Sync {
    /// Load the state for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read or the stored value does
    /// not decode.
    fn get(
        &self,
        identifier: &Identifier,
    ) -> impl std::future::Future<Output = Result<Option<AccountLockState>>> + Send;

    /// Store `state` under `identifier`.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    fn put(
        &self,
        identifier: &Identifier,
        state: &AccountLockState,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Drop the entry for `identifier` (logical delete).
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    fn remove(
        &self,
        identifier: &Identifier,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
