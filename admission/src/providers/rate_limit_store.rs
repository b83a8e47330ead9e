//! Rate limit store trait.
//!
//! # Semantics
//!
//! A store keeps one window record per key. Recording a hit is a single
//! atomic read-modify-write:
//!
//! 1. Create the record (`count = 0`, `window_start = now`) if missing
//! 2. If `now - window_start > window`, reset `count = 0`, `window_start = now`
//! 3. Increment `count`
//! 4. Return the resulting record
//!
//! Concurrent hits on the same key must serialize; hits on different keys
//! should not contend.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// State of a client's window immediately after a hit was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Requests observed in the current window, including this one
    pub count: u64,
    /// When the current window began
    pub window_start: DateTime<Utc>,
}

/// Storage for per-client window records.
///
/// # Example
///
/// ```
/// use ticketgate_admission::providers::RateLimitStore;
/// use ticketgate_admission::stores::MemoryRateLimitStore;
/// use chrono::Utc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryRateLimitStore::new();
/// let now = Utc::now();
///
/// let first = store.record_hit("orders:1.2.3.4", Duration::from_secs(60), now).await?;
/// let second = store.record_hit("orders:1.2.3.4", Duration::from_secs(60), now).await?;
///
/// assert_eq!(first.count, 1);
/// assert_eq!(second.count, 2);
/// # Ok(())
/// # }
/// ```
pub trait RateLimitStore: Send + Sync {
    /// Record a hit for `key` and return the updated window.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError`] if the backend fails.
    fn record_hit(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<WindowSnapshot>> + Send;

    /// Forget the record for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError`] if the backend fails.
    fn reset(&self, key: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Remove records whose window started more than `max_idle` before `now`.
    ///
    /// Returns the number of records removed. Stores with their own expiry
    /// (e.g. `Redis` TTLs) may return `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError`] if the backend fails.
    fn sweep(
        &self,
        now: DateTime<Utc>,
        max_idle: Duration,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}
