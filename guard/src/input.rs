//! Denylist pre-check for values about to be sent to the identity provider.
//!
//! This is a heuristic guard, not a sanitizer: it rejects, it never
//! rewrites. The default list also rejects apostrophes and semicolons, which
//! legitimate passwords may contain; applications that need those characters
//! should configure a narrower list.

use crate::error::{GuardError, Result};
use regex::Regex;

/// Compiled denylist.
///
/// # Example
///
/// ```
/// use login_guard::InputFilter;
///
/// let filter = InputFilter::default();
/// assert!(filter.input_is_well_formed("normal.user@example.com"));
/// assert!(!filter.input_is_well_formed("' OR '1'='1"));
/// ```
#[derive(Debug, Clone)]
pub struct InputFilter {
    patterns: Vec<Regex>,
}

impl InputFilter {
    /// Compile `patterns`, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::InvalidConfig` naming the first pattern that is
    /// not a valid regex.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p)
                    .map_err(|e| GuardError::InvalidConfig(format!("denylist pattern {p:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// `false` if `value` matches any pattern.
    #[must_use]
    pub fn input_is_well_formed(&self, value: &str) -> bool {
        self.first_match(value).is_none()
    }

    /// The first pattern `value` matches, if any.
    #[must_use]
    pub fn first_match(&self, value: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|re| re.is_match(value))
            .map(Regex::as_str)
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// `true` when nothing is denied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for InputFilter {
    fn default() -> Self {
        let patterns = crate::config::DEFAULT_DENYLIST
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self { patterns }
    }
}
