//! Custom Axum extractors.
//!
//! - `ClientIdentity`: stable rate-limit identifier derived from forwarding headers
//! - `CorrelationId`: request correlation ID set by the request-context middleware
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(identity: ClientIdentity, correlation_id: CorrelationId) -> String {
//!     format!("{} via {}", identity.as_str(), correlation_id.0)
//! }
//! ```

use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use uuid::Uuid;

/// Header carrying the proxy chain, client first.
pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

/// Header set by proxies that forward a single client address.
pub const REAL_IP_HEADER: &str = "X-Real-IP";

/// Identifier used when no forwarding header is present.
pub const LOOPBACK_IDENTITY: &str = "127.0.0.1";

/// Derive the caller's identifier from request headers.
///
/// # Priority
///
/// 1. `X-Forwarded-For` (first entry in the list)
/// 2. `X-Real-IP`
/// 3. [`LOOPBACK_IDENTITY`]
///
/// The value is treated as opaque; it is trimmed but not parsed.
///
/// # Example
///
/// ```
/// use axum::http::{HeaderMap, HeaderValue};
/// use ticketgate_web::extractors::resolve_client_identity;
///
/// let mut headers = HeaderMap::new();
/// assert_eq!(resolve_client_identity(&headers), "127.0.0.1");
///
/// headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.1, 10.0.0.1"));
/// assert_eq!(resolve_client_identity(&headers), "203.0.113.1");
/// ```
#[must_use]
pub fn resolve_client_identity(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let real_ip = || {
        headers
            .get(REAL_IP_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(LOOPBACK_IDENTITY)
        .to_string()
}

/// Caller identity used as the rate-limit key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    /// Identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_client_identity(&parts.headers)))
    }
}

/// Correlation ID for request tracing.
///
/// Reads the ID stored by the request-context middleware, then the
/// `X-Correlation-ID` header, and generates a new UUID v4 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| {
                parts
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}
