//! End-to-end tests against the assembled router.
//!
//! Requests go through the full middleware stack with `tower::ServiceExt::oneshot`;
//! time is controlled with a `ManualClock` shared with the admission controller.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Integration tests can use unwrap/expect

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::RETRY_AFTER},
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use ticketgate_admission::{AdmissionController, RatePolicy, stores::MemoryRateLimitStore};
use ticketgate_core::environment::Clock;
use ticketgate_core::{IntakeService, PaymentMethod};
use ticketgate_testing::fixtures;
use ticketgate_testing::mocks::{
    FailingIntakeService, ManualClock, RecordingIntakeService, test_clock,
};
use ticketgate_web::{AppState, CORRELATION_ID_HEADER, GatePolicies, RouteGate, build_router};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    clock: ManualClock,
}

impl TestApp {
    fn with_intake(intake: Arc<dyn IntakeService>) -> Self {
        Self::with_policies(intake, GatePolicies::default())
    }

    fn with_policies(intake: Arc<dyn IntakeService>, policies: GatePolicies) -> Self {
        let clock = ManualClock::new(test_clock().now());
        let admission = AdmissionController::new(MemoryRateLimitStore::new(), clock.clone());
        let gate = RouteGate::new(Arc::new(admission), intake).with_policies(policies);

        Self {
            router: build_router(AppState::new(gate)),
            clock,
        }
    }

    async fn post(&self, path: &str, ip: &str, body: impl Into<Body>) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("X-Forwarded-For", ip)
            .header("Content-Type", "application/json")
            .body(body.into())
            .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn post_json(&self, path: &str, ip: &str, body: &Value) -> Response {
        self.post(path, ip, serde_json::to_vec(body).unwrap()).await
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_sixth_order_in_window_is_rate_limited() {
    let app = TestApp::with_intake(Arc::new(RecordingIntakeService::new()));

    for i in 1..=5 {
        let response = app
            .post_json("/api/orders", "1.2.3.4", &fixtures::order_json())
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "request {i}");
    }

    let response = app
        .post_json("/api/orders", "1.2.3.4", &fixtures::order_json())
        .await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[RETRY_AFTER], "60");
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Too many requests. Please slow down." })
    );

    // Another client is unaffected.
    let response = app
        .post_json("/api/orders", "5.6.7.8", &fixtures::order_json())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_rate_limit_resets_after_window() {
    let app = TestApp::with_intake(Arc::new(RecordingIntakeService::new()));

    for _ in 0..6 {
        app.post_json("/api/orders", "1.2.3.4", &fixtures::order_json())
            .await;
    }

    app.clock.advance(Duration::from_millis(60_000));
    let response = app
        .post_json("/api/orders", "1.2.3.4", &fixtures::order_json())
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    app.clock.advance(Duration::from_millis(1));
    let response = app
        .post_json("/api/orders", "1.2.3.4", &fixtures::order_json())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_general_limit_applies_across_api_routes() {
    let policies = GatePolicies {
        general: RatePolicy::new("api", 3, Duration::from_secs(60)).unwrap(),
        ..GatePolicies::default()
    };
    let app = TestApp::with_policies(Arc::new(RecordingIntakeService::new()), policies);

    let order = app
        .post_json("/api/orders", "9.9.9.9", &fixtures::order_json())
        .await;
    assert_eq!(order.status(), StatusCode::CREATED);

    for _ in 0..2 {
        let response = app
            .post_json("/api/waitlist", "9.9.9.9", &fixtures::waitlist_json())
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Both sensitive policies still have room; the general one does not.
    let response = app
        .post_json("/api/orders", "9.9.9.9", &fixtures::order_json())
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_waitlist_phone_validation() {
    let intake = Arc::new(RecordingIntakeService::new());
    let app = TestApp::with_intake(intake.clone());

    let response = app
        .post_json(
            "/api/waitlist",
            "1.2.3.4",
            &fixtures::with(fixtures::waitlist_json(), &json!({ "phone": "12345" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Invalid phone number" })
    );

    let response = app
        .post_json("/api/waitlist", "1.2.3.4", &fixtures::waitlist_json())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["eventId"], "evt-2025-jazz");
    assert_eq!(body["status"], "waiting");
    assert_eq!(intake.waitlist()[0].phone(), Some("+919876543210"));
}

#[tokio::test]
async fn test_order_validation_messages() {
    let app = TestApp::with_intake(Arc::new(RecordingIntakeService::new()));

    let cases = [
        (json!({ "tickets": [] }), "At least one ticket is required"),
        (
            json!({ "tickets": [{ "ticketId": "vip", "quantity": 11 }] }),
            "Maximum 10 tickets per type",
        ),
        (json!({ "userEmail": "not-an-email" }), "Invalid email address"),
        (json!({ "paymentMethod": "cash" }), "Invalid payment method"),
    ];

    // Distinct clients so the order policy never trips.
    for (i, (overrides, message)) in cases.into_iter().enumerate() {
        let body = fixtures::with(fixtures::order_json(), &overrides);
        let response = app
            .post_json("/api/orders", &format!("10.0.0.{i}"), &body)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{message}");
        assert_eq!(json_body(response).await, json!({ "error": message }));
    }
}

#[tokio::test]
async fn test_order_accepted_with_defaults() {
    let intake = Arc::new(RecordingIntakeService::new());
    let app = TestApp::with_intake(intake.clone());

    let body = fixtures::with(
        fixtures::order_json(),
        &json!({ "tickets": [{ "ticketId": "general", "quantity": 10 }] }),
    );
    let response = app.post_json("/api/orders", "1.2.3.4", &body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt = json_body(response).await;
    assert_eq!(receipt["totalTickets"], 10);
    assert_eq!(receipt["paymentMethod"], "card");

    let orders = intake.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].payment_method(), PaymentMethod::Card);
    assert_eq!(orders[0].user_email(), "a@b.com");
}

#[tokio::test]
async fn test_invalid_body() {
    let app = TestApp::with_intake(Arc::new(RecordingIntakeService::new()));

    let response = app.post("/api/orders", "1.2.3.4", "{not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Invalid request body" })
    );
}

#[tokio::test]
async fn test_oversized_body_keeps_error_shape() {
    let intake = Arc::new(RecordingIntakeService::new());
    let app = TestApp::with_intake(intake.clone());

    let response = app
        .post("/api/orders", "1.2.3.4", vec![b' '; 3 * 1024 * 1024])
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Request body too large" })
    );
    assert!(intake.orders().is_empty());
}

#[tokio::test]
async fn test_intake_failure_returns_generic_error() {
    let app = TestApp::with_intake(Arc::new(FailingIntakeService));

    let response = app
        .post_json("/api/orders", "1.2.3.4", &fixtures::order_json())
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Internal server error" })
    );
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let app = TestApp::with_intake(Arc::new(RecordingIntakeService::new()));

    for _ in 0..30 {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("X-Forwarded-For", "1.2.3.4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_responses_carry_correlation_id() {
    let app = TestApp::with_intake(Arc::new(RecordingIntakeService::new()));

    let response = app.post("/api/orders", "1.2.3.4", "{}").await;

    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
}

#[tokio::test]
async fn test_missing_forwarding_headers_share_loopback_identity() {
    let app = TestApp::with_intake(Arc::new(RecordingIntakeService::new()));
    let anonymous = || {
        Request::builder()
            .method("POST")
            .uri("/api/waitlist")
            .body(Body::from(serde_json::to_vec(&fixtures::waitlist_json()).unwrap()))
            .unwrap()
    };

    for _ in 0..5 {
        let response = app.router.clone().oneshot(anonymous()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.router.clone().oneshot(anonymous()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
