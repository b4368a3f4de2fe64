//! Guard configuration.
//!
//! Configuration values should be provided by the application; the defaults
//! match a "three strikes, fifteen minutes" policy.

use crate::error::{GuardError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Environment variable: failures before lock.
pub const ENV_THRESHOLD: &str = "LOGIN_GUARD_THRESHOLD";
/// Environment variable: lockout length in seconds.
pub const ENV_LOCKOUT_SECONDS: &str = "LOGIN_GUARD_LOCKOUT_SECONDS";
/// Environment variable: `true`/`1` to persist lock state.
pub const ENV_PERSISTENCE: &str = "LOGIN_GUARD_PERSISTENCE";
/// Environment variable: `Redis` URL for the durable lock store.
pub const ENV_REDIS_URL: &str = "LOGIN_GUARD_REDIS_URL";

/// Default denylist, checked in order by the input filter.
///
/// Blocks SQL statement shapes and `<script>` case-insensitively, plus the
/// single quote, semicolon and SQL comment marker anywhere in the value.
pub const DEFAULT_DENYLIST: [&str; 8] = [
    r"(?i)SELECT.*FROM",
    r"(?i)INSERT.*INTO",
    r"(?i)UPDATE.*SET",
    r"(?i)DELETE.*FROM",
    r"(?i)<script>",
    r"'",
    r";",
    r"--",
];

/// Lockout guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Consecutive failures before the account locks.
    ///
    /// Default: 3
    pub threshold: u32,

    /// Lockout length in seconds.
    ///
    /// Default: 900 (15 minutes)
    pub lockout_duration_seconds: u64,

    /// Regex patterns rejected by the input filter, checked in order.
    ///
    /// Default: [`DEFAULT_DENYLIST`]
    pub denylist_patterns: Vec<String>,

    /// Persist lock state through a durable store.
    ///
    /// Default: false (in-memory only)
    pub persistence_enabled: bool,

    /// `Redis` URL used when persistence is enabled.
    pub redis_url: Option<String>,
}

impl GuardConfig {
    /// Create configuration with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the lockout length in seconds.
    #[must_use]
    pub const fn with_lockout_duration_seconds(mut self, seconds: u64) -> Self {
        self.lockout_duration_seconds = seconds;
        self
    }

    /// Replace the denylist.
    #[must_use]
    pub fn with_denylist<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable durable persistence.
    #[must_use]
    pub const fn with_persistence(mut self, enabled: bool) -> Self {
        self.persistence_enabled = enabled;
        self
    }

    /// Set the `Redis` URL for the durable store.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Lockout length as a `chrono` duration.
    #[must_use]
    pub fn lockout_duration(&self) -> Duration {
        i64::try_from(self.lockout_duration_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Check the values that cannot be expressed in the types.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::InvalidConfig` if the threshold is zero or the
    /// lockout duration is zero.
    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(GuardError::InvalidConfig(
                "threshold must be at least 1".to_string(),
            ));
        }
        if self.lockout_duration_seconds == 0 {
            return Err(GuardError::InvalidConfig(
                "lockout_duration_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration from `LOGIN_GUARD_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::InvalidConfig` if a variable is set but does not
    /// parse, or if the result fails [`GuardConfig::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map.
    ///
    /// # Errors
    ///
    /// Same as [`GuardConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_THRESHOLD) {
            config.threshold = parse_var(ENV_THRESHOLD, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOCKOUT_SECONDS) {
            config.lockout_duration_seconds = parse_var(ENV_LOCKOUT_SECONDS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PERSISTENCE) {
            config.persistence_enabled = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(GuardError::InvalidConfig(format!(
                        "{ENV_PERSISTENCE}: expected a boolean, got {other:?}"
                    )));
                }
            };
        }
        if let Some(raw) = lookup(ENV_REDIS_URL) {
            config.redis_url = Some(raw);
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            lockout_duration_seconds: 900,
            denylist_patterns: DEFAULT_DENYLIST.iter().map(ToString::to_string).collect(),
            persistence_enabled: false,
            redis_url: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| GuardError::InvalidConfig(format!("{key}: {e}")))
}
