//! Error types for admission control.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failure inside a rate limit store.
///
/// The controller never lets these escape as request failures: a store that
/// cannot answer causes the request to be denied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend (e.g. `Redis`) operation failed.
    #[error("Rate limit backend error: {0}")]
    Backend(String),

    /// Backend returned data the store could not interpret.
    #[error("Unexpected rate limit backend response: {0}")]
    UnexpectedResponse(String),
}

/// Invalid rate policy configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Limit must allow at least one request.
    #[error("Rate limit for '{policy}' must be at least 1 request")]
    ZeroLimit {
        /// Policy name
        policy: &'static str,
    },

    /// Window must be a positive duration.
    #[error("Rate limit window for '{policy}' must be positive")]
    ZeroWindow {
        /// Policy name
        policy: &'static str,
    },
}
