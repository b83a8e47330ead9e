//! Admission control for ticketgate.
//!
//! Decides, per client identifier, whether a request may proceed before any
//! real work is done. Counting uses a rolling window that restarts a fixed
//! duration after its first request:
//!
//! ```text
//! first hit            window elapsed
//!    │◀──────── window ────────▶│
//!    ├── 1 ── 2 ── … ── limit ──┤── limit+1 denied ── … ─▶ next hit resets count
//! ```
//!
//! Bursts straddling a window boundary are accepted; the scheme trades that
//! inaccuracy for one counter per client.
//!
//! # Components
//!
//! - [`providers::RateLimitStore`]: storage port for per-client window records
//! - [`stores::MemoryRateLimitStore`]: sharded in-process store (default)
//! - `stores::RedisRateLimitStore`: shared store for multi-instance deployments
//!   (feature `redis`)
//! - [`AdmissionController`]: applies a [`RatePolicy`] using a store and a clock
//! - [`sweeper`]: background eviction of idle records
//!
//! # Example
//!
//! ```
//! use ticketgate_admission::{AdmissionController, RatePolicy, stores::MemoryRateLimitStore};
//! use ticketgate_core::environment::SystemClock;
//!
//! # async fn example() {
//! let controller = AdmissionController::new(MemoryRateLimitStore::new(), SystemClock);
//! let policy = RatePolicy::sensitive("orders");
//!
//! for _ in 0..5 {
//!     assert!(controller.check("1.2.3.4", &policy).await.is_allowed());
//! }
//! assert!(!controller.check("1.2.3.4", &policy).await.is_allowed());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod controller;
pub mod error;
pub mod policy;
pub mod providers;
pub mod stores;
pub mod sweeper;

pub use controller::{ADHOC_NAMESPACE, AdmissionController, Decision, FALLBACK_IDENTIFIER};
pub use error::{PolicyError, StoreError};
pub use policy::RatePolicy;
pub use providers::{RateLimitStore, WindowSnapshot};
