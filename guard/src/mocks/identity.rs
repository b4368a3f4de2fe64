//! Mock identity provider for testing.

use crate::error::ProviderError;
use crate::providers::{IdentityProvider, ProviderResult};
use crate::state::{Identifier, Principal, Session, SessionId, UserId};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
struct Account {
    secret: String,
    principal: Principal,
}

/// Mock identity provider.
///
/// Keeps accounts in memory, counts `authenticate` calls and records the
/// highest number of calls that were in flight at the same time. Clones
/// share all state.
///
/// # Example
///
/// ```
/// use login_guard::mocks::MockIdentityProvider;
///
/// let provider = MockIdentityProvider::new().with_account("test@test.com", "Test123!");
/// assert_eq!(provider.authenticate_calls(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    accounts: Arc<Mutex<HashMap<Identifier, Account>>>,
    session: Arc<Mutex<Option<Session>>>,
    authenticate_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    network_down: Arc<AtomicBool>,
    latency: Option<std::time::Duration>,
}

impl MockIdentityProvider {
    /// Create a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account.
    #[must_use]
    pub fn with_account(self, email: &str, secret: &str) -> Self {
        self.insert_account(&Identifier::new(email), secret);
        self
    }

    /// Sleep for `latency` inside every `authenticate` call.
    #[must_use]
    pub const fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every call fail with `ProviderError::Network`.
    pub fn set_network_down(&self, down: bool) {
        self.network_down.store(down, Ordering::SeqCst);
    }

    /// Number of `authenticate` calls so far.
    #[must_use]
    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent `authenticate` calls observed.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn insert_account(&self, id: &Identifier, secret: &str) -> Principal {
        let principal = Principal {
            user_id: UserId::new(),
            email: id.to_string(),
            last_sign_in_at: None,
        };
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id.clone(),
                Account {
                    secret: secret.to_string(),
                    principal: principal.clone(),
                },
            );
        principal
    }

    fn check_network(&self) -> ProviderResult<()> {
        if self.network_down.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    fn verify(&self, id: &Identifier, secret: &str) -> ProviderResult<Principal> {
        self.check_network()?;

        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        let account = accounts.get_mut(id).ok_or(ProviderError::UserNotFound)?;
        if account.secret != secret {
            return Err(ProviderError::InvalidCredentials);
        }

        let principal = account.principal.clone();
        account.principal.last_sign_in_at = Some(Utc::now());
        drop(accounts);

        let now = Utc::now();
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(Session {
            session_id: SessionId::new(),
            principal: principal.clone(),
            created_at: now,
            expires_at: now + Duration::hours(1),
        });

        Ok(principal)
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn authenticate(
        &self,
        identifier: &Identifier,
        secret: &str,
    ) -> impl Future<Output = ProviderResult<Principal>> + Send {
        let provider = self.clone();
        let id = identifier.clone();
        let secret = secret.to_string();

        async move {
            provider.authenticate_calls.fetch_add(1, Ordering::SeqCst);
            let current = provider.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            provider.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if let Some(latency) = provider.latency {
                tokio::time::sleep(latency).await;
            }
            let result = provider.verify(&id, &secret);

            provider.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn sign_up(
        &self,
        identifier: &Identifier,
        secret: &str,
    ) -> impl Future<Output = ProviderResult<Principal>> + Send {
        let provider = self.clone();
        let id = identifier.clone();
        let secret = secret.to_string();

        async move {
            provider.check_network()?;

            let exists = provider
                .accounts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(&id);
            if exists {
                return Err(ProviderError::Rejected("user already registered".to_string()));
            }
            if secret.len() < 6 {
                return Err(ProviderError::Rejected(
                    "password should be at least 6 characters".to_string(),
                ));
            }

            Ok(provider.insert_account(&id, &secret))
        }
    }

    fn current_session(&self) -> impl Future<Output = ProviderResult<Option<Session>>> + Send {
        let provider = self.clone();

        async move {
            provider.check_network()?;
            Ok(provider
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone())
        }
    }

    fn sign_out(&self) -> impl Future<Output = ProviderResult<()>> + Send {
        let provider = self.clone();

        async move {
            provider.check_network()?;
            provider
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            Ok(())
        }
    }
}
