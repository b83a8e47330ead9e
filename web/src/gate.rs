//! Route gate: the composition point for mutating endpoints.
//!
//! Every request passes the same sequence and stops at the first failure:
//!
//! ```text
//! identity ──▶ admission ──▶ schema ──▶ rules (orders) ──▶ intake
//!                 │            │            │                 │
//!            RateLimited  InvalidInput  InvalidInput   InternalFailure
//! ```
//!
//! The gate does no HTTP work. Handlers feed it the resolved identity and the
//! raw body; [`GateError`] converts into [`AppError`] at the edge.

use crate::error::AppError;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use ticketgate_admission::providers::RateLimitStore;
use ticketgate_admission::{AdmissionController, Decision, RatePolicy};
use ticketgate_core::environment::Clock;
use ticketgate_core::{
    IntakeError, IntakeService, OrderReceipt, OrderRules, Schema, WaitlistReceipt, schema,
};

/// Object-safe view of an admission controller.
///
/// Lets the gate hold any store/clock combination behind one pointer, so
/// the backend can be chosen at startup.
pub trait AdmissionCheck: Send + Sync {
    /// Record a request under `policy` and decide whether it may proceed.
    fn check<'a>(&'a self, identifier: &'a str, policy: &'a RatePolicy) -> BoxFuture<'a, Decision>;
}

impl<S, C> AdmissionCheck for AdmissionController<S, C>
where
    S: RateLimitStore,
    C: Clock,
{
    fn check<'a>(&'a self, identifier: &'a str, policy: &'a RatePolicy) -> BoxFuture<'a, Decision> {
        Box::pin(Self::check(self, identifier, policy))
    }
}

/// Policies applied by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicies {
    /// Applied to every `/api` request
    pub general: RatePolicy,
    /// Applied to order creation
    pub orders: RatePolicy,
    /// Applied to waitlist sign-ups
    pub waitlist: RatePolicy,
}

impl Default for GatePolicies {
    fn default() -> Self {
        Self {
            general: RatePolicy::general(),
            orders: RatePolicy::sensitive("orders"),
            waitlist: RatePolicy::sensitive("waitlist"),
        }
    }
}

/// Why the gate refused a request.
#[derive(Debug, Error)]
pub enum GateError {
    /// The client exceeded its rate limit.
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited {
        /// Time until the client's window ends
        retry_after: Duration,
    },

    /// The body failed schema validation or a business rule.
    #[error("{0}")]
    InvalidInput(String),

    /// The intake collaborator failed.
    #[error("intake failed: {0}")]
    InternalFailure(#[from] IntakeError),
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::RateLimited { retry_after } => Self::rate_limited(retry_after),
            GateError::InvalidInput(message) => Self::bad_request(message),
            GateError::InternalFailure(source) => Self::internal().with_source(source.into()),
        }
    }
}

/// Admission, validation and intake for the mutating routes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ticketgate_admission::{AdmissionController, stores::MemoryRateLimitStore};
/// use ticketgate_core::{InMemoryIntakeService, environment::SystemClock};
/// use ticketgate_web::gate::RouteGate;
///
/// # async fn example() {
/// let gate = RouteGate::new(
///     Arc::new(AdmissionController::new(MemoryRateLimitStore::new(), SystemClock)),
///     Arc::new(InMemoryIntakeService::new()),
/// );
///
/// let body = br#"{"eventId":"evt-1","tickets":[{"ticketId":"vip","quantity":1}],
///     "userEmail":"a@b.com"}"#;
/// let receipt = gate.create_order("1.2.3.4", body).await.unwrap();
/// assert_eq!(receipt.total_tickets, 1);
/// # }
/// ```
#[derive(Clone)]
pub struct RouteGate {
    admission: Arc<dyn AdmissionCheck>,
    intake: Arc<dyn IntakeService>,
    rules: OrderRules,
    policies: GatePolicies,
}

impl RouteGate {
    /// Create a gate with the default policies and rules.
    #[must_use]
    pub fn new(admission: Arc<dyn AdmissionCheck>, intake: Arc<dyn IntakeService>) -> Self {
        Self {
            admission,
            intake,
            rules: OrderRules::default(),
            policies: GatePolicies::default(),
        }
    }

    /// Replace the order rules.
    #[must_use]
    pub const fn with_rules(mut self, rules: OrderRules) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the rate policies.
    #[must_use]
    pub const fn with_policies(mut self, policies: GatePolicies) -> Self {
        self.policies = policies;
        self
    }

    /// Policies in effect.
    #[must_use]
    pub const fn policies(&self) -> &GatePolicies {
        &self.policies
    }

    /// Apply the general API policy.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::RateLimited`] if the client is over its quota.
    pub async fn admit_general(&self, identity: &str) -> Result<(), GateError> {
        self.admit(identity, &self.policies.general).await
    }

    /// Admit, validate and hand an order to the intake service.
    ///
    /// # Errors
    ///
    /// Fails with the first stage that rejects the request.
    pub async fn create_order(
        &self,
        identity: &str,
        body: &[u8],
    ) -> Result<OrderReceipt, GateError> {
        self.admit(identity, &self.policies.orders).await?;

        let request = schema::validate_order(body)
            .map_err(|e| invalid_input(Schema::Order, e.to_string()))?;
        let intent = self
            .rules
            .assemble(request)
            .map_err(|e| invalid_input(Schema::Order, e.to_string()))?;

        let result = self.intake.create_order(intent).await;
        record_intake("order", result.is_ok());

        let receipt = result?;
        tracing::info!(
            order_id = %receipt.order_id,
            event_id = %receipt.event_id,
            total_tickets = receipt.total_tickets,
            "Order accepted"
        );
        Ok(receipt)
    }

    /// Admit, validate and hand a waitlist sign-up to the intake service.
    ///
    /// # Errors
    ///
    /// Fails with the first stage that rejects the request.
    pub async fn join_waitlist(
        &self,
        identity: &str,
        body: &[u8],
    ) -> Result<WaitlistReceipt, GateError> {
        self.admit(identity, &self.policies.waitlist).await?;

        let intent = schema::validate_waitlist(body)
            .map_err(|e| invalid_input(Schema::WaitlistJoin, e.to_string()))?;

        let result = self.intake.join_waitlist(intent).await;
        record_intake("waitlist", result.is_ok());

        let receipt = result?;
        tracing::info!(
            entry_id = %receipt.entry_id,
            event_id = %receipt.event_id,
            "Waitlist entry accepted"
        );
        Ok(receipt)
    }

    async fn admit(&self, identity: &str, policy: &RatePolicy) -> Result<(), GateError> {
        match self.admission.check(identity, policy).await {
            Decision::Allowed { .. } => Ok(()),
            Decision::Limited { retry_after } => Err(GateError::RateLimited { retry_after }),
        }
    }
}

fn invalid_input(schema: Schema, message: String) -> GateError {
    metrics::counter!("ticketgate_validation_failures_total", "schema" => schema.name())
        .increment(1);
    tracing::debug!(schema = %schema, error = %message, "Request rejected");
    GateError::InvalidInput(message)
}

fn record_intake(kind: &'static str, ok: bool) {
    let outcome = if ok { "accepted" } else { "failed" };
    metrics::counter!("ticketgate_intake_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}
