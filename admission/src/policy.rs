//! Rate policies: how many requests a client may make per window.

use crate::error::PolicyError;
use std::num::NonZeroU32;
use std::time::Duration;

/// Requests per window allowed on general API routes.
pub const GENERAL_LIMIT: u32 = 20;

/// Requests per window allowed on sensitive actions (orders, waitlist).
pub const SENSITIVE_LIMIT: u32 = 5;

/// Window length shared by the built-in policies.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// A named `(limit, window)` pair.
///
/// The name scopes the counter: the same client is tracked independently
/// under each policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    name: &'static str,
    limit: NonZeroU32,
    window: Duration,
}

impl RatePolicy {
    /// Create a validated policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if `limit` is zero or `window` is empty.
    pub fn new(name: &'static str, limit: u32, window: Duration) -> Result<Self, PolicyError> {
        let limit = NonZeroU32::new(limit).ok_or(PolicyError::ZeroLimit { policy: name })?;

        if window.is_zero() {
            return Err(PolicyError::ZeroWindow { policy: name });
        }

        Ok(Self {
            name,
            limit,
            window,
        })
    }

    /// General API policy: 20 requests per 60 seconds.
    #[must_use]
    pub const fn general() -> Self {
        Self::from_const("api", GENERAL_LIMIT, DEFAULT_WINDOW)
    }

    /// Sensitive-action policy: 5 requests per 60 seconds.
    #[must_use]
    pub const fn sensitive(name: &'static str) -> Self {
        Self::from_const(name, SENSITIVE_LIMIT, DEFAULT_WINDOW)
    }

    const fn from_const(name: &'static str, limit: u32, window: Duration) -> Self {
        let limit = match NonZeroU32::new(limit) {
            Some(limit) => limit,
            None => NonZeroU32::MIN,
        };
        Self {
            name,
            limit,
            window,
        }
    }

    /// Policy name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Requests allowed per window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit.get()
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Store key for a client under this policy.
    #[must_use]
    pub fn scoped_key(&self, identifier: &str) -> String {
        format!("{}:{identifier}", self.name)
    }
}
