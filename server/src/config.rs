//! Configuration management for the ticketgate server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparseable values fall back to the default rather than aborting startup.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use ticketgate_admission::policy::{DEFAULT_WINDOW, GENERAL_LIMIT, SENSITIVE_LIMIT};
use ticketgate_admission::sweeper::SweepConfig;
use ticketgate_admission::{PolicyError, RatePolicy};
use ticketgate_core::OrderRules;
use ticketgate_web::GatePolicies;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
    /// Order business-rule configuration
    pub orders: OrderConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Tracing filter directives (`RUST_LOG` syntax)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Where rate limit counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Process-local `DashMap` store
    #[default]
    Memory,
    /// Shared Redis store (requires the `redis` feature)
    Redis,
}

impl FromStr for RateLimitBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            _ => Err(()),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per window on every `/api` route
    pub general_requests: u32,
    /// General window in milliseconds
    pub general_window_ms: u64,
    /// Requests per window on order and waitlist routes
    pub sensitive_requests: u32,
    /// Sensitive window in milliseconds
    pub sensitive_window_ms: u64,
    /// Seconds between sweeps of idle records
    pub sweep_interval_secs: u64,
    /// Records idle longer than this many seconds are evicted
    pub max_idle_secs: u64,
    /// Soft cap on tracked clients in the in-memory store
    pub max_entries: usize,
    /// Counter storage backend
    pub backend: RateLimitBackend,
    /// Redis connection URL (used by the Redis backend)
    pub redis_url: String,
}

/// Order business-rule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Optional cap on total tickets across all lines of one order
    pub max_tickets_per_order: Option<u32>,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed(&lookup, "PORT").unwrap_or(8080),
                log_level: lookup("RUST_LOG")
                    .unwrap_or_else(|| "info,ticketgate=debug".to_string()),
                shutdown_timeout: parsed(&lookup, "SHUTDOWN_TIMEOUT").unwrap_or(30),
            },
            rate_limit: RateLimitConfig {
                general_requests: parsed(&lookup, "RATE_LIMIT_GENERAL_REQUESTS")
                    .unwrap_or(GENERAL_LIMIT),
                general_window_ms: parsed(&lookup, "RATE_LIMIT_GENERAL_WINDOW_MS")
                    .unwrap_or(window_ms(DEFAULT_WINDOW)),
                sensitive_requests: parsed(&lookup, "RATE_LIMIT_SENSITIVE_REQUESTS")
                    .unwrap_or(SENSITIVE_LIMIT),
                sensitive_window_ms: parsed(&lookup, "RATE_LIMIT_SENSITIVE_WINDOW_MS")
                    .unwrap_or(window_ms(DEFAULT_WINDOW)),
                sweep_interval_secs: parsed(&lookup, "RATE_LIMIT_SWEEP_INTERVAL_SECS")
                    .unwrap_or(60),
                max_idle_secs: parsed(&lookup, "RATE_LIMIT_MAX_IDLE_SECS").unwrap_or(300),
                max_entries: parsed(&lookup, "RATE_LIMIT_MAX_ENTRIES").unwrap_or(100_000),
                backend: parsed(&lookup, "RATE_LIMIT_BACKEND").unwrap_or_default(),
                redis_url: lookup("REDIS_URL")
                    .unwrap_or_else(|| "redis://localhost:6379".to_string()),
            },
            orders: OrderConfig {
                max_tickets_per_order: parsed(&lookup, "MAX_TICKETS_PER_ORDER"),
            },
        }
    }

    /// Address to bind the HTTP listener to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }
}

impl RateLimitConfig {
    /// Build the gate's rate policies.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if a limit or window is zero.
    pub fn policies(&self) -> Result<GatePolicies, PolicyError> {
        let general_window = Duration::from_millis(self.general_window_ms);
        let sensitive_window = Duration::from_millis(self.sensitive_window_ms);

        Ok(GatePolicies {
            general: RatePolicy::new("api", self.general_requests, general_window)?,
            orders: RatePolicy::new("orders", self.sensitive_requests, sensitive_window)?,
            waitlist: RatePolicy::new("waitlist", self.sensitive_requests, sensitive_window)?,
        })
    }

    /// Sweeper schedule.
    ///
    /// The idle threshold is raised to the longest window if configured
    /// lower, so a sweep never resets a live window.
    #[must_use]
    pub fn sweep_config(&self) -> SweepConfig {
        let longest_window = self.general_window_ms.max(self.sensitive_window_ms);
        let max_idle = Duration::from_secs(self.max_idle_secs)
            .max(Duration::from_millis(longest_window));

        SweepConfig {
            interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            max_idle,
        }
    }
}

impl OrderConfig {
    /// Build the order rules.
    #[must_use]
    pub const fn rules(&self) -> OrderRules {
        match self.max_tickets_per_order {
            Some(max) => OrderRules::new().with_max_tickets_per_order(max),
            None => OrderRules::new(),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

fn window_ms(window: Duration) -> u64 {
    u64::try_from(window.as_millis()).unwrap_or(u64::MAX)
}
