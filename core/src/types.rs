//! Domain types for order and waitlist intake.
//!
//! `OrderRequest` is the shape-checked output of the order schema and is
//! still subject to business rules. `OrderIntent` and `WaitlistIntent` are
//! the verified contracts handed to downstream services; their fields are
//! private so they cannot be altered after construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest quantity a single line item may request.
pub const MIN_TICKETS_PER_TYPE: u32 = 1;

/// Largest quantity a single line item may request.
pub const MAX_TICKETS_PER_TYPE: u32 = 10;

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit or debit card (default)
    #[default]
    Card,
    /// Unified Payments Interface
    Upi,
    /// Direct bank transfer
    Netbanking,
}

impl PaymentMethod {
    /// Wire name of the payment method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Netbanking => "netbanking",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "netbanking" => Ok(Self::Netbanking),
            _ => Err(()),
        }
    }
}

/// One requested ticket tier and count within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLineItem {
    /// Ticket tier identifier
    pub ticket_id: String,
    /// Number of tickets of this tier
    pub quantity: u32,
}

impl TicketLineItem {
    /// Create a line item.
    #[must_use]
    pub fn new(ticket_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            quantity,
        }
    }
}

/// Shape-valid order payload, normalized and with defaults applied.
///
/// Produced by [`crate::schema::validate_order`]; consumed by
/// [`crate::rules::OrderRules::assemble`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Event the tickets belong to
    pub event_id: String,
    /// Requested line items, in request order
    pub tickets: Vec<TicketLineItem>,
    /// Buyer email (lowercased)
    pub user_email: String,
    /// Buyer display name
    pub user_name: Option<String>,
    /// Payment method (defaults to card)
    pub payment_method: PaymentMethod,
}

/// Verified order, safe to hand to the order-creation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    event_id: String,
    tickets: Vec<TicketLineItem>,
    user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    payment_method: PaymentMethod,
}

impl OrderIntent {
    pub(crate) fn from_request(request: OrderRequest) -> Self {
        Self {
            event_id: request.event_id,
            tickets: request.tickets,
            user_email: request.user_email,
            user_name: request.user_name,
            payment_method: request.payment_method,
        }
    }

    /// Event the order is for.
    #[must_use]
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Line items, one per ticket type.
    #[must_use]
    pub fn tickets(&self) -> &[TicketLineItem] {
        &self.tickets
    }

    /// Buyer email.
    #[must_use]
    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    /// Buyer display name, if given.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// Payment method.
    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Sum of all line-item quantities.
    #[must_use]
    pub fn total_tickets(&self) -> u32 {
        self.tickets.iter().map(|line| line.quantity).sum()
    }
}

/// Verified waitlist registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistIntent {
    event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ticket_id: Option<String>,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
}

impl WaitlistIntent {
    pub(crate) const fn new(
        event_id: String,
        ticket_id: Option<String>,
        email: String,
        phone: Option<String>,
    ) -> Self {
        Self {
            event_id,
            ticket_id,
            email,
            phone,
        }
    }

    /// Event to wait for.
    #[must_use]
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Specific ticket tier, if any.
    #[must_use]
    pub fn ticket_id(&self) -> Option<&str> {
        self.ticket_id.as_deref()
    }

    /// Contact email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Contact phone in international format, if given.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}
