//! Admission controller.
//!
//! Applies a [`RatePolicy`] to a client identifier using an injected store
//! and clock. The controller never fails a request with an error: store
//! failures are logged and the request is denied.

use crate::error::Result;
use crate::policy::RatePolicy;
use crate::providers::{RateLimitStore, WindowSnapshot};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use ticketgate_core::environment::Clock;

/// Identifier used when the caller could not derive one.
pub const FALLBACK_IDENTIFIER: &str = "anonymous";

/// Key namespace for [`AdmissionController::admit`], kept apart from policy names.
pub const ADHOC_NAMESPACE: &str = "adhoc";

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed.
    Allowed {
        /// Requests left in the current window
        remaining: u32,
    },
    /// Request exceeds the policy.
    Limited {
        /// Time until the current window ends
        retry_after: Duration,
    },
}

impl Decision {
    /// Whether the request may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    const fn outcome(&self) -> &'static str {
        match self {
            Self::Allowed { .. } => "allowed",
            Self::Limited { .. } => "limited",
        }
    }
}

/// Rate limiter over a pluggable store.
///
/// # Example
///
/// ```
/// use ticketgate_admission::{AdmissionController, stores::MemoryRateLimitStore};
/// use ticketgate_core::environment::SystemClock;
/// use std::time::Duration;
///
/// # async fn example() {
/// let controller = AdmissionController::new(MemoryRateLimitStore::new(), SystemClock);
///
/// assert!(controller.admit("1.2.3.4", 1, Duration::from_secs(60)).await);
/// assert!(!controller.admit("1.2.3.4", 1, Duration::from_secs(60)).await);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AdmissionController<S, C> {
    store: S,
    clock: C,
}

impl<S, C> AdmissionController<S, C>
where
    S: RateLimitStore,
    C: Clock,
{
    /// Create a controller.
    #[must_use]
    pub const fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Record a request under `identifier` and report whether it fits within
    /// `limit` requests per `window`.
    ///
    /// Counters live under [`ADHOC_NAMESPACE`], so they never collide with a
    /// policy-scoped key. An empty identifier is replaced by
    /// [`FALLBACK_IDENTIFIER`].
    pub async fn admit(&self, identifier: &str, limit: u32, window: Duration) -> bool {
        let key = format!("{ADHOC_NAMESPACE}:{}", non_empty(identifier));
        let now = self.clock.now();

        match self.store.record_hit(&key, window, now).await {
            Ok(snapshot) => snapshot.count <= u64::from(limit),
            Err(error) => {
                tracing::error!(
                    error = %error,
                    key = %key,
                    "Rate limit store failed (safe default: deny)"
                );
                false
            }
        }
    }

    /// Record a request under `policy` and decide whether it may proceed.
    ///
    /// The counter is scoped by policy name, so each policy tracks the
    /// client separately.
    pub async fn check(&self, identifier: &str, policy: &RatePolicy) -> Decision {
        let identifier = non_empty(identifier);
        let key = policy.scoped_key(identifier);
        let now = self.clock.now();

        let decision = match self.store.record_hit(&key, policy.window(), now).await {
            Ok(snapshot) => decide(&snapshot, policy, now),
            Err(error) => {
                tracing::error!(
                    error = %error,
                    key = %key,
                    policy = policy.name(),
                    "Rate limit store failed (safe default: deny)"
                );
                Decision::Limited {
                    retry_after: policy.window(),
                }
            }
        };

        metrics::counter!(
            "ticketgate_admission_total",
            "policy" => policy.name(),
            "outcome" => decision.outcome()
        )
        .increment(1);

        match decision {
            Decision::Allowed { remaining } => tracing::debug!(
                identifier = %identifier,
                policy = policy.name(),
                remaining,
                "Request admitted"
            ),
            Decision::Limited { retry_after } => tracing::warn!(
                rate_limit_exceeded = true,
                identifier = %identifier,
                policy = policy.name(),
                limit = policy.limit(),
                retry_after_ms = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
                "Rate limit exceeded"
            ),
        }

        decision
    }

    /// Forget the counter for `identifier` under `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError`] if the store fails.
    pub async fn reset(&self, identifier: &str, policy: &RatePolicy) -> Result<()> {
        self.store
            .reset(&policy.scoped_key(non_empty(identifier)))
            .await
    }

    /// Evict records idle for longer than `max_idle`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError`] if the store fails.
    pub async fn sweep(&self, max_idle: Duration) -> Result<usize> {
        self.store.sweep(self.clock.now(), max_idle).await
    }
}

const fn non_empty(identifier: &str) -> &str {
    if identifier.is_empty() {
        FALLBACK_IDENTIFIER
    } else {
        identifier
    }
}

fn decide(snapshot: &WindowSnapshot, policy: &RatePolicy, now: DateTime<Utc>) -> Decision {
    let limit = u64::from(policy.limit());

    if snapshot.count <= limit {
        let remaining = u32::try_from(limit - snapshot.count).unwrap_or(u32::MAX);
        return Decision::Allowed { remaining };
    }

    // Windows too long to represent as a date fall back to the full window.
    let retry_after = TimeDelta::from_std(policy.window())
        .ok()
        .and_then(|window| snapshot.window_start.checked_add_signed(window))
        .map_or(policy.window(), |window_end| {
            window_end
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO)
        });

    Decision::Limited { retry_after }
}
