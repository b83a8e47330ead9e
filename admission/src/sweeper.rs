//! Background eviction of idle rate limit records.
//!
//! Without sweeping, the in-memory store keeps one record for every client it
//! has ever seen. The sweeper periodically removes records whose window
//! started more than `max_idle` ago. `max_idle` should be at least the longest
//! policy window, otherwise a client could shed its count early.

use crate::controller::AdmissionController;
use crate::providers::RateLimitStore;
use std::sync::Arc;
use std::time::Duration;
use ticketgate_core::environment::Clock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Sweeper schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweeps
    pub interval: Duration,
    /// Records idle for longer than this are removed
    pub max_idle: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_idle: Duration::from_secs(300),
        }
    }
}

/// Spawn a task that sweeps the controller's store on a fixed interval.
///
/// The task runs until the returned handle is aborted (or the runtime shuts
/// down). Store errors are logged and the next tick retries.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ticketgate_admission::{AdmissionController, stores::MemoryRateLimitStore};
/// use ticketgate_admission::sweeper::{SweepConfig, spawn_sweeper};
/// use ticketgate_core::environment::SystemClock;
///
/// # async fn example() {
/// let controller = Arc::new(AdmissionController::new(MemoryRateLimitStore::new(), SystemClock));
/// let handle = spawn_sweeper(Arc::clone(&controller), SweepConfig::default());
///
/// // ... on shutdown
/// handle.abort();
/// # }
/// ```
pub fn spawn_sweeper<S, C>(
    controller: Arc<AdmissionController<S, C>>,
    config: SweepConfig,
) -> JoinHandle<()>
where
    S: RateLimitStore + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match controller.sweep(config.max_idle).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Swept idle rate limit records"),
                Err(error) => tracing::warn!(error = %error, "Rate limit sweep failed"),
            }
        }
    })
}
