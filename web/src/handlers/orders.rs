//! Order intake endpoint.

use crate::WebResult;
use crate::extractors::ClientIdentity;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
};
use ticketgate_core::OrderReceipt;

/// Create an order.
///
/// # Endpoint
///
/// ```text
/// POST /api/orders
/// ```
///
/// # Request
///
/// ```json
/// {
///   "eventId": "evt-2025-jazz",
///   "tickets": [{ "ticketId": "general", "quantity": 2 }],
///   "userEmail": "ada@example.com",
///   "paymentMethod": "upi"
/// }
/// ```
///
/// # Errors
///
/// - 429 when the client exceeds the order policy
/// - 400 with the first violated constraint
/// - 413 when the body exceeds the size limit
/// - 500 when the intake service fails
pub async fn create_order(
    State(state): State<AppState>,
    identity: ClientIdentity,
    body: Result<Bytes, BytesRejection>,
) -> WebResult<(StatusCode, Json<OrderReceipt>)> {
    let body = body?;
    let receipt = state.gate.create_order(identity.as_str(), &body).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
