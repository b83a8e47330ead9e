//! Business rules applied to shape-valid orders.
//!
//! Schema validation guarantees types; this stage guarantees the order makes
//! sense to the inventory system: one line per ticket type, quantities in
//! bounds, and an optional cap on tickets per order.

use crate::error::RuleViolation;
use crate::types::{MAX_TICKETS_PER_TYPE, MIN_TICKETS_PER_TYPE, OrderIntent, OrderRequest};
use std::collections::HashSet;

/// Rule set for turning an [`OrderRequest`] into an [`OrderIntent`].
///
/// # Example
///
/// ```
/// use ticketgate_core::{OrderRequest, OrderRules, PaymentMethod, RuleViolation, TicketLineItem};
///
/// let request = OrderRequest {
///     event_id: "evt-1".into(),
///     tickets: vec![TicketLineItem::new("vip", 2), TicketLineItem::new("vip", 1)],
///     user_email: "a@b.com".into(),
///     user_name: None,
///     payment_method: PaymentMethod::Card,
/// };
///
/// let err = OrderRules::default().assemble(request).unwrap_err();
/// assert!(matches!(err, RuleViolation::DuplicateTicketType { .. }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderRules {
    max_tickets_per_order: Option<u32>,
}

impl OrderRules {
    /// Rules with no per-order cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_tickets_per_order: None,
        }
    }

    /// Cap the total number of tickets across all line items.
    #[must_use]
    pub const fn with_max_tickets_per_order(mut self, max: u32) -> Self {
        self.max_tickets_per_order = Some(max);
        self
    }

    /// Configured per-order cap, if any.
    #[must_use]
    pub const fn max_tickets_per_order(&self) -> Option<u32> {
        self.max_tickets_per_order
    }

    /// Check every rule and build the immutable intent.
    ///
    /// Rules run in a fixed order: non-empty, per-line quantity bounds,
    /// duplicate ticket types, per-order cap.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleViolation`] encountered.
    pub fn assemble(&self, request: OrderRequest) -> Result<OrderIntent, RuleViolation> {
        if request.tickets.is_empty() {
            return Err(RuleViolation::NoTickets);
        }

        if let Some(line) = request
            .tickets
            .iter()
            .find(|line| !(MIN_TICKETS_PER_TYPE..=MAX_TICKETS_PER_TYPE).contains(&line.quantity))
        {
            return Err(RuleViolation::QuantityOutOfRange {
                ticket_id: line.ticket_id.clone(),
                min: MIN_TICKETS_PER_TYPE,
                max: MAX_TICKETS_PER_TYPE,
            });
        }

        let mut seen = HashSet::with_capacity(request.tickets.len());
        for line in &request.tickets {
            if !seen.insert(line.ticket_id.as_str()) {
                return Err(RuleViolation::DuplicateTicketType {
                    ticket_id: line.ticket_id.clone(),
                });
            }
        }

        if let Some(max) = self.max_tickets_per_order {
            let requested: u32 = request.tickets.iter().map(|line| line.quantity).sum();
            if requested > max {
                return Err(RuleViolation::TooManyTickets { requested, max });
            }
        }

        Ok(OrderIntent::from_request(request))
    }
}
