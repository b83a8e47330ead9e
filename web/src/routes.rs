//! Router assembly.

use crate::error::AppError;
use crate::handlers;
use crate::middleware::{correlation_id_layer, general_rate_limit};
use crate::state::AppState;
use axum::{
    Router,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// ```text
/// GET  /health          liveness, never rate limited
/// POST /api/orders      general policy, then order policy
/// POST /api/waitlist    general policy, then waitlist policy
/// ```
///
/// # Example
///
/// ```ignore
/// let app = build_router(AppState::new(gate));
/// axum::serve(listener, app).await?;
/// ```
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/orders", post(handlers::create_order))
        .route("/waitlist", post(handlers::join_waitlist))
        .layer(from_fn_with_state(state.clone(), general_rate_limit));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    AppError::internal()
        .with_source(anyhow::anyhow!("handler panicked: {detail}"))
        .into_response()
}
