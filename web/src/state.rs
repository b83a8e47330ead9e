//! Application state for Axum handlers.

use crate::gate::RouteGate;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: the gate sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Admission, validation and intake for mutating routes
    pub gate: Arc<RouteGate>,
}

impl AppState {
    /// Create application state around a gate.
    #[must_use]
    pub fn new(gate: RouteGate) -> Self {
        Self {
            gate: Arc::new(gate),
        }
    }
}
