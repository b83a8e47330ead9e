//! In-process rate limit store.
//!
//! Records live in a [`DashMap`], whose sharded locks make each
//! read-modify-write atomic per key without a global lock. Nothing here
//! awaits, so a hit completes without suspending the calling task.
//!
//! # Memory Management
//!
//! Records are created lazily and are not removed by hits. Call
//! [`RateLimitStore::sweep`] periodically (see [`crate::sweeper`]) and/or set a
//! capacity with [`MemoryRateLimitStore::with_max_entries`]. When a new key
//! arrives at capacity, records whose window has already elapsed are dropped
//! first; if that frees less than a batch (1/16 of capacity), the oldest
//! windows are evicted to make up the difference. Each full scan therefore
//! buys room for many new keys. The capacity is soft: racing inserts may
//! briefly exceed it.

use crate::error::Result;
use crate::providers::{RateLimitStore, WindowSnapshot};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Fraction of capacity (as a divisor) freed by one eviction pass.
const EVICTION_BATCH_DIVISOR: usize = 16;

/// Per-client window record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindowRecord {
    /// Requests observed since `window_start`
    pub count: u64,
    /// Start of the current window
    pub window_start: DateTime<Utc>,
    window: TimeDelta,
}

impl ClientWindowRecord {
    const fn new(now: DateTime<Utc>, window: TimeDelta) -> Self {
        Self {
            count: 0,
            window_start: now,
            window,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.window_start) > self.window
    }

    fn observe(&mut self, now: DateTime<Utc>, window: TimeDelta) -> WindowSnapshot {
        self.window = window;
        if self.is_expired(now) {
            self.count = 0;
            self.window_start = now;
        }
        self.count = self.count.saturating_add(1);

        WindowSnapshot {
            count: self.count,
            window_start: self.window_start,
        }
    }
}

/// Sharded in-memory store. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRateLimitStore {
    records: Arc<DashMap<String, ClientWindowRecord>>,
    max_entries: Option<usize>,
}

impl MemoryRateLimitStore {
    /// Create an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of tracked keys.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no keys are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current record for `key`, if any.
    #[must_use]
    pub fn record(&self, key: &str) -> Option<ClientWindowRecord> {
        self.records.get(key).map(|record| *record)
    }

    fn make_room_for(&self, key: &str, now: DateTime<Utc>) {
        let Some(max_entries) = self.max_entries else {
            return;
        };
        if self.records.len() < max_entries || self.records.contains_key(key) {
            return;
        }

        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        let expired = before.saturating_sub(self.records.len());
        if expired > 0 {
            metrics::counter!("ticketgate_rate_limit_evictions_total", "reason" => "idle")
                .increment(expired as u64);
        }

        let batch = (max_entries / EVICTION_BATCH_DIVISOR).max(1);
        let target = max_entries.saturating_sub(batch);
        let excess = self.records.len().saturating_sub(target);
        if excess == 0 {
            return;
        }

        let mut candidates: Vec<(DateTime<Utc>, String)> = self
            .records
            .iter()
            .map(|entry| (entry.value().window_start, entry.key().clone()))
            .collect();
        let excess = excess.min(candidates.len());
        if excess == 0 {
            return;
        }
        candidates.select_nth_unstable_by_key(excess - 1, |(window_start, _)| *window_start);

        for (_, oldest) in candidates.drain(..excess) {
            self.records.remove(&oldest);
        }
        metrics::counter!("ticketgate_rate_limit_evictions_total", "reason" => "capacity")
            .increment(excess as u64);
        tracing::debug!(
            evicted = excess,
            expired,
            max_entries,
            "Evicted oldest rate limit records"
        );
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn record_hit(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<WindowSnapshot> {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);

        if let Some(mut record) = self.records.get_mut(key) {
            return Ok(record.observe(now, window));
        }

        self.make_room_for(key, now);

        let snapshot = self
            .records
            .entry(key.to_owned())
            .or_insert_with(|| ClientWindowRecord::new(now, window))
            .observe(now, window);

        Ok(snapshot)
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.records.remove(key);

        tracing::info!(key = %key, "Reset rate limit record");

        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>, max_idle: Duration) -> Result<usize> {
        let max_idle = TimeDelta::from_std(max_idle).unwrap_or(TimeDelta::MAX);
        let before = self.records.len();

        self.records
            .retain(|_, record| now.signed_duration_since(record.window_start) <= max_idle);

        let removed = before.saturating_sub(self.records.len());
        if removed > 0 {
            metrics::counter!("ticketgate_rate_limit_evictions_total", "reason" => "idle")
                .increment(removed as u64);
        }

        Ok(removed)
    }
}
