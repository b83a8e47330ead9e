//! Waitlist sign-up endpoint.

use crate::WebResult;
use crate::extractors::ClientIdentity;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
};
use ticketgate_core::WaitlistReceipt;

/// Join the waitlist for a sold-out event.
///
/// # Endpoint
///
/// ```text
/// POST /api/waitlist
/// ```
///
/// # Errors
///
/// - 429 when the client exceeds the waitlist policy
/// - 400 with the first violated constraint
/// - 413 when the body exceeds the size limit
/// - 500 when the intake service fails
pub async fn join_waitlist(
    State(state): State<AppState>,
    identity: ClientIdentity,
    body: Result<Bytes, BytesRejection>,
) -> WebResult<(StatusCode, Json<WaitlistReceipt>)> {
    let body = body?;
    let receipt = state.gate.join_waitlist(identity.as_str(), &body).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
