//! Error types for the login guard.

use thiserror::Error;

/// Result type alias for guard operations.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Everything a login submission can fail with.
///
/// All variants are recovered at the guard boundary and handed to the UI as
/// values. Use [`GuardError::user_message`] for text shown to end users; the
/// `Display` output of system variants may carry internal detail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    // ═══════════════════════════════════════════════════════════
    // Pre-dispatch rejections
    // ═══════════════════════════════════════════════════════════

    /// Input matched the denylist. Never dispatched, never counted.
    #[error("Invalid input detected")]
    InputRejected,

    /// The account is locked out. Never dispatched.
    #[error("Too many failed attempts, retry in {retry_after_seconds}s")]
    Locked {
        /// Whole seconds until the lock expires (rounded up).
        retry_after_seconds: u64,
    },

    // ═══════════════════════════════════════════════════════════
    // Dispatched attempts
    // ═══════════════════════════════════════════════════════════

    /// The identity provider refused the credentials.
    ///
    /// Deliberately does not say whether the account exists.
    #[error("Invalid credentials")]
    AuthenticationFailed,

    /// A session or sign-up call to the identity provider failed.
    #[error("Identity provider error: {0}")]
    Provider(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The lock store could not be read or written. Non-fatal.
    #[error("Lock store unavailable: {0}")]
    PersistenceUnavailable(String),

    /// Configuration rejected at construction time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl GuardError {
    /// Returns `true` if this error is due to what the user submitted.
    ///
    /// # Examples
    ///
    /// ```
    /// # use login_guard::GuardError;
    /// assert!(GuardError::AuthenticationFailed.is_user_error());
    /// assert!(!GuardError::InternalError("x".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InputRejected | Self::Locked { .. } | Self::AuthenticationFailed
        )
    }

    /// Returns `true` if this error indicates a possible attack.
    ///
    /// # Examples
    ///
    /// ```
    /// # use login_guard::GuardError;
    /// assert!(GuardError::InputRejected.is_security_issue());
    /// assert!(!GuardError::AuthenticationFailed.is_security_issue());
    /// ```
    #[must_use]
    pub const fn is_security_issue(&self) -> bool {
        matches!(self, Self::InputRejected | Self::Locked { .. })
    }

    /// Text that is safe to render in the UI.
    ///
    /// # Examples
    ///
    /// ```
    /// # use login_guard::GuardError;
    /// let err = GuardError::PersistenceUnavailable("redis://10.0.0.4 refused".into());
    /// assert!(!err.user_message().contains("redis"));
    /// ```
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InputRejected | Self::Locked { .. } | Self::AuthenticationFailed => {
                self.to_string()
            }
            Self::Provider(_) => "The sign-in service is unavailable, please try again".to_string(),
            Self::PersistenceUnavailable(_) | Self::InvalidConfig(_) | Self::InternalError(_) => {
                "Something went wrong, please try again".to_string()
            }
        }
    }
}

/// Errors reported by an [`IdentityProvider`](crate::providers::IdentityProvider).
///
/// Provider detail stays on this side of the guard; login failures collapse
/// to [`GuardError::AuthenticationFailed`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Wrong secret for an existing account.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// No account with that identifier.
    #[error("user not found")]
    UserNotFound,

    /// Sign-up refused (duplicate account, weak password, ...).
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Transport failure talking to the provider.
    #[error("network error: {0}")]
    Network(String),
}

impl From<ProviderError> for GuardError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}
