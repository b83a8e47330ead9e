//! Metrics for the ticketgate server.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ticketgate_admission_total{policy,outcome}` - Admission decisions per policy
//! - `ticketgate_validation_failures_total{schema}` - Requests rejected by validation or rules
//! - `ticketgate_intake_total{kind,outcome}` - Intents handed to the intake service
//! - `ticketgate_rate_limit_evictions_total{reason}` - Rate limit records evicted (idle, capacity)

use metrics::describe_counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Register all metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "ticketgate_admission_total",
        "Admission decisions by policy and outcome (allowed, limited)"
    );
    describe_counter!(
        "ticketgate_validation_failures_total",
        "Requests rejected by schema validation or business rules, by schema"
    );
    describe_counter!(
        "ticketgate_intake_total",
        "Intents handed to the intake service by kind and outcome (accepted, failed)"
    );
    describe_counter!(
        "ticketgate_rate_limit_evictions_total",
        "Rate limit records evicted by reason (idle, capacity)"
    );

    tracing::info!("Metrics registered");
}

/// Install the Prometheus recorder and register metric descriptions.
///
/// # Errors
///
/// Returns [`BuildError`] if a recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(handle)
}
