//! Axum middleware for request tracking and admission.
//!
//! - **Correlation IDs**: extract or generate a correlation ID per request,
//!   open a tracing span with it, and echo it in the response
//! - **General rate limit**: apply the general API policy to every request
//!   under `/api` before it reaches a handler
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware::from_fn_with_state};
//! use ticketgate_web::middleware::{correlation_id_layer, general_rate_limit};
//!
//! let api = Router::new()
//!     .route("/orders", post(create_order))
//!     .layer(from_fn_with_state(state.clone(), general_rate_limit));
//!
//! let app = Router::new()
//!     .nest("/api", api)
//!     .layer(correlation_id_layer())
//!     .with_state(state);
//! ```

use crate::error::AppError;
use crate::extractors::ClientIdentity;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create a layer that adds correlation ID tracking to all requests.
///
/// The layer stores the ID in request extensions, runs the request inside an
/// `http_request` span, logs status and latency on completion, and writes the
/// ID to the response `X-Correlation-ID` header.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Copy, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            uri = %req.uri(),
        );

        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;

                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Request completed"
                );

                if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response
                        .headers_mut()
                        .insert(CORRELATION_ID_HEADER, header_value);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Apply the general API rate limit before the request reaches a handler.
///
/// Install with [`axum::middleware::from_fn_with_state`].
///
/// # Errors
///
/// Returns a 429 [`AppError`] when the client is over its general quota.
pub async fn general_rate_limit(
    State(state): State<AppState>,
    identity: ClientIdentity,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.gate.admit_general(identity.as_str()).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::extractors::CorrelationId;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use std::sync::Arc;
    use ticketgate_admission::{AdmissionController, RatePolicy, stores::MemoryRateLimitStore};
    use ticketgate_core::environment::SystemClock;
    use ticketgate_testing::mocks::RecordingIntakeService;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_correlation_id_generated_if_missing() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(correlation_id_layer());

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        let correlation_id = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("Correlation ID header should be present");
        assert!(Uuid::parse_str(correlation_id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_correlation_id_preserved_from_request() {
        let app = Router::new()
            .route(
                "/test",
                get(|id: CorrelationId| async move { id.0.to_string() }),
            )
            .layer(correlation_id_layer());

        let request_uuid = Uuid::new_v4();
        let request = Request::builder()
            .uri("/test")
            .header(CORRELATION_ID_HEADER, request_uuid.to_string())
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        let response_id = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("Correlation ID header should be present")
            .to_str()
            .unwrap();
        assert_eq!(response_id, request_uuid.to_string());
    }

    #[tokio::test]
    async fn test_invalid_uuid_generates_new() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(correlation_id_layer());

        let request = Request::builder()
            .uri("/test")
            .header(CORRELATION_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        let uuid_str = response.headers()[CORRELATION_ID_HEADER].to_str().unwrap();
        assert!(Uuid::parse_str(uuid_str).is_ok());
        assert_ne!(uuid_str, "not-a-uuid");
    }

    #[tokio::test]
    async fn test_general_rate_limit_blocks_after_quota() {
        let gate = crate::gate::RouteGate::new(
            Arc::new(AdmissionController::new(MemoryRateLimitStore::new(), SystemClock)),
            Arc::new(RecordingIntakeService::new()),
        )
        .with_policies(crate::gate::GatePolicies {
            general: RatePolicy::new("api", 2, std::time::Duration::from_secs(60)).unwrap(),
            ..crate::gate::GatePolicies::default()
        });
        let state = AppState::new(gate);

        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(from_fn_with_state(state.clone(), general_rate_limit))
            .with_state(state);

        let call = |ip: &'static str| {
            app.clone().oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("X-Forwarded-For", ip)
                    .body(Body::empty())
                    .unwrap(),
            )
        };

        assert_eq!(call("1.2.3.4").await.unwrap().status(), StatusCode::OK);
        assert_eq!(call("1.2.3.4").await.unwrap().status(), StatusCode::OK);

        let limited = call("1.2.3.4").await.unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(limited.headers().contains_key("retry-after"));

        assert_eq!(call("5.6.7.8").await.unwrap().status(), StatusCode::OK);
    }
}
