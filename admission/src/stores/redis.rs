//! `Redis`-backed rate limit store.
//!
//! Shares window records between instances. Each key holds the window's
//! request count and expires when the window ends, so no sweeping is needed.
//!
//! # Algorithm
//!
//! A Lua script runs atomically on the server:
//! 1. `INCR` the counter
//! 2. On the first hit of a window, `PEXPIRE` it to the window length
//! 3. Return the count and remaining TTL
//!
//! The window start is recovered as `now - (window - ttl)`. Windows end when
//! the key expires, i.e. at `window_start + window` rather than strictly after.

use crate::error::{Result, StoreError};
use crate::providers::{RateLimitStore, WindowSnapshot};
use chrono::{DateTime, TimeDelta, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use std::sync::LazyLock;
use std::time::Duration;

static HIT_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
local count = redis.call('INCR', KEYS[1])
local ttl = redis.call('PTTL', KEYS[1])
if count == 1 or ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
",
    )
});

/// `Redis` rate limit store.
///
/// # Example
///
/// ```no_run
/// use ticketgate_admission::stores::RedisRateLimitStore;
/// use ticketgate_admission::{AdmissionController, RatePolicy};
/// use ticketgate_core::environment::SystemClock;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RedisRateLimitStore::new("redis://127.0.0.1:6379").await?;
/// let controller = AdmissionController::new(store, SystemClock);
///
/// let decision = controller.check("1.2.3.4", &RatePolicy::sensitive("orders")).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisRateLimitStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisRateLimitStore {
    /// Connect to `Redis`.
    ///
    /// # Errors
    ///
    /// Returns error if connection to `Redis` fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| StoreError::Backend(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            StoreError::Backend(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    /// `Redis` key for a rate limit record.
    fn rate_limit_key(key: &str) -> String {
        format!("rate_limit:{key}")
    }
}

impl RateLimitStore for RedisRateLimitStore {
    async fn record_hit(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<WindowSnapshot> {
        let mut conn = self.conn_manager.clone();
        let rate_key = Self::rate_limit_key(key);
        #[allow(clippy::cast_possible_truncation)] // Safe: rate limit windows are small durations
        let window_ms = window.as_millis().max(1) as u64;

        let (count, ttl_ms): (u64, i64) = HIT_SCRIPT
            .key(&rate_key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key, "Redis rate limit script failed");
                StoreError::Backend(format!("Failed to record rate limit hit: {e}"))
            })?;

        if ttl_ms < 0 {
            return Err(StoreError::UnexpectedResponse(format!(
                "negative TTL {ttl_ms} for {rate_key}"
            )));
        }

        #[allow(clippy::cast_possible_wrap)] // window_ms bounded by policy configuration
        let elapsed_ms = (window_ms as i64).saturating_sub(ttl_ms).max(0);
        let window_start = now - TimeDelta::milliseconds(elapsed_ms);

        tracing::debug!(key = %key, count, ttl_ms, "Recorded rate limit hit");

        Ok(WindowSnapshot {
            count,
            window_start,
        })
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let rate_key = Self::rate_limit_key(key);

        let _: () = conn
            .del(&rate_key)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to reset rate limit: {e}")))?;

        tracing::info!(key = %key, "Reset rate limit");

        Ok(())
    }

    async fn sweep(&self, _now: DateTime<Utc>, _max_idle: Duration) -> Result<usize> {
        // Keys expire on their own.
        Ok(0)
    }
}
