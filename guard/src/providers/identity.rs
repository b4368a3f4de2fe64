//! Identity provider trait.

use crate::error::ProviderError;
use crate::state::{Identifier, Principal, Session};

/// Result type for identity provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Hosted identity provider.
///
/// This trait abstracts over the backend-as-a-service that owns user
/// accounts and sessions. The guard never inspects secrets; it only decides
/// whether `authenticate` may be called.
///
/// # Implementation Notes
///
/// - `authenticate` must not be retried internally; every call counts as
///   one attempt
/// - Errors should be specific (`InvalidCredentials` vs `UserNotFound`); the
///   login flow hides the difference from end users
pub trait IdentityProvider: Send + Sync {
    /// Verify `secret` for `identifier` and open a session.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Wrong secret → `ProviderError::InvalidCredentials`
    /// - Unknown account → `ProviderError::UserNotFound`
    /// - Network request fails → `ProviderError::Network`
    fn authenticate(
        &self,
        identifier: &Identifier,
        secret: &str,
    ) -> impl std::future::Future<Output = ProviderResult<Principal>> + Send;

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Account exists or the secret is refused → `ProviderError::Rejected`
    /// - Network request fails → `ProviderError::Network`
    fn sign_up(
        &self,
        identifier: &Identifier,
        secret: &str,
    ) -> impl std::future::Future<Output = ProviderResult<Principal>> + Send;

    /// The session of the signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the network request fails.
    fn current_session(
        &self,
    ) -> impl std::future::Future<Output = ProviderResult<Option<Session>>> + Send;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns error if the network request fails.
    fn sign_out(&self) -> impl std::future::Future<Output = ProviderResult<()>> + Send;
}
