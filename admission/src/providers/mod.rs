//! Provider traits for admission control.
//!
//! Stores are injected rather than global so that tests get isolated state and
//! deployments can choose between process-local and shared counters.

pub mod rate_limit_store;

pub use rate_limit_store::{RateLimitStore, WindowSnapshot};
