//! Axum integration for ticketgate.
//!
//! This crate is the imperative shell around the pure validation logic in
//! `ticketgate-core` and the admission control in `ticketgate-admission`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, headers
//! │  - Client identity resolution           │  ← Correlation IDs, logging
//! │  - Error → status code mapping          │  ← Metrics
//! ├─────────────────────────────────────────┤
//! │         Route Gate                      │
//! │  - Admission (rate limiting)            │  ← Injected store + clock
//! │  - Schema validation, business rules    │  ← Pure, no I/O
//! │  - Hand-off to the intake service       │  ← Injected collaborator
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Correlation ID** assigned, request span opened
//! 2. **General policy** applied to every `/api` request
//! 3. **Handler** resolves the client identity and passes the raw body to the gate
//! 4. **Gate** applies the route policy, validates, assembles, and calls intake
//! 5. **`AppError`** maps any failure to `{ "error": ... }` with the right status
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ticketgate_admission::{AdmissionController, stores::MemoryRateLimitStore};
//! use ticketgate_core::{InMemoryIntakeService, environment::SystemClock};
//! use ticketgate_web::{AppState, RouteGate, build_router};
//!
//! let gate = RouteGate::new(
//!     Arc::new(AdmissionController::new(MemoryRateLimitStore::new(), SystemClock)),
//!     Arc::new(InMemoryIntakeService::new()),
//! );
//! let app: axum::Router = build_router(AppState::new(gate));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ClientIdentity, CorrelationId, resolve_client_identity};
pub use gate::{AdmissionCheck, GateError, GatePolicies, RouteGate};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
