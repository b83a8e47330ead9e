//! Intake collaborator port.
//!
//! Verified intents are handed to an [`IntakeService`], which owns order
//! persistence and payment. Ticketgate only defines the contract; the
//! [`InMemoryIntakeService`] is a process-local implementation for
//! development and single-instance deployments.

use crate::error::IntakeError;
use crate::types::{OrderIntent, PaymentMethod, WaitlistIntent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Receipt for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    /// Identifier assigned to the order
    pub order_id: Uuid,
    /// Event the order is for
    pub event_id: String,
    /// Total tickets across all line items
    pub total_tickets: u32,
    /// Chosen payment method
    pub payment_method: PaymentMethod,
    /// Order status (`pending` until payment completes)
    pub status: String,
    /// When the order was accepted
    pub created_at: DateTime<Utc>,
}

/// Receipt for a waitlist registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistReceipt {
    /// Identifier assigned to the waitlist entry
    pub entry_id: Uuid,
    /// Event being waited on
    pub event_id: String,
    /// Entry status
    pub status: String,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
}

/// Downstream order and waitlist creation.
///
/// Implementations receive only verified intents.
#[async_trait]
pub trait IntakeService: Send + Sync {
    /// Create an order from a verified intent.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError`] if the downstream service fails.
    async fn create_order(&self, intent: OrderIntent) -> Result<OrderReceipt, IntakeError>;

    /// Register a waitlist entry from a verified intent.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError`] if the downstream service fails.
    async fn join_waitlist(&self, intent: WaitlistIntent) -> Result<WaitlistReceipt, IntakeError>;
}

/// Process-local intake service keeping accepted intents in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIntakeService {
    orders: Arc<DashMap<Uuid, OrderIntent>>,
    waitlist: Arc<DashMap<Uuid, WaitlistIntent>>,
}

impl InMemoryIntakeService {
    /// Create an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of waitlist entries.
    #[must_use]
    pub fn waitlist_count(&self) -> usize {
        self.waitlist.len()
    }

    /// Look up an accepted order.
    #[must_use]
    pub fn order(&self, order_id: &Uuid) -> Option<OrderIntent> {
        self.orders.get(order_id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl IntakeService for InMemoryIntakeService {
    async fn create_order(&self, intent: OrderIntent) -> Result<OrderReceipt, IntakeError> {
        let order_id = Uuid::new_v4();
        let receipt = OrderReceipt {
            order_id,
            event_id: intent.event_id().to_string(),
            total_tickets: intent.total_tickets(),
            payment_method: intent.payment_method(),
            status: "pending".to_string(),
            created_at: Utc::now(),
        };

        tracing::debug!(order_id = %order_id, "Stored order");

        self.orders.insert(order_id, intent);
        Ok(receipt)
    }

    async fn join_waitlist(&self, intent: WaitlistIntent) -> Result<WaitlistReceipt, IntakeError> {
        let entry_id = Uuid::new_v4();
        let receipt = WaitlistReceipt {
            entry_id,
            event_id: intent.event_id().to_string(),
            status: "waiting".to_string(),
            created_at: Utc::now(),
        };

        tracing::debug!(entry_id = %entry_id, "Stored waitlist entry");

        self.waitlist.insert(entry_id, intent);
        Ok(receipt)
    }
}
