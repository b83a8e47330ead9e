//! Error types for order intake.
//!
//! Each stage of the pipeline has its own error type so the stages stay
//! independently testable. The web layer is the only place that maps them
//! onto HTTP responses.

use thiserror::Error;

/// Message reported when the body is not a JSON object at all.
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// Structural validation failure.
///
/// Carries the first violated constraint. `Display` yields the user-facing
/// message only, which is surfaced verbatim to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Body could not be parsed as a JSON object.
    #[error("Invalid request body")]
    InvalidBody,

    /// A field violated its declared constraint.
    #[error("{message}")]
    Field {
        /// Path of the offending field (e.g. `tickets[1].quantity`)
        field: String,
        /// Human-readable constraint message
        message: &'static str,
    },
}

impl ValidationError {
    /// Create a field error.
    #[must_use]
    pub fn field(field: impl Into<String>, message: &'static str) -> Self {
        Self::Field {
            field: field.into(),
            message,
        }
    }

    /// Path of the offending field, if any.
    #[must_use]
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Self::InvalidBody => None,
            Self::Field { field, .. } => Some(field),
        }
    }
}

/// Business-rule violation raised while assembling an order intent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// The order contains no line items.
    #[error("At least one ticket is required")]
    NoTickets,

    /// A line item requests a quantity outside the per-type bounds.
    #[error("Quantity must be between {min} and {max}")]
    QuantityOutOfRange {
        /// Offending ticket type
        ticket_id: String,
        /// Minimum allowed quantity
        min: u32,
        /// Maximum allowed quantity
        max: u32,
    },

    /// Two line items reference the same ticket type.
    #[error("Duplicate ticket type: {ticket_id}")]
    DuplicateTicketType {
        /// The repeated ticket type
        ticket_id: String,
    },

    /// The order as a whole exceeds the configured ticket cap.
    #[error("Maximum {max} tickets per order")]
    TooManyTickets {
        /// Tickets requested
        requested: u32,
        /// Configured cap
        max: u32,
    },
}

/// Failure reported by an intake collaborator (order or waitlist service).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntakeError {
    /// The downstream service is not reachable.
    #[error("Intake service unavailable: {0}")]
    Unavailable(String),

    /// Unexpected failure inside the downstream service.
    #[error("Intake service error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_displays_message_only() {
        let err = ValidationError::field("tickets[0].quantity", "Maximum 10 tickets per type");
        assert_eq!(err.to_string(), "Maximum 10 tickets per type");
        assert_eq!(err.field_path(), Some("tickets[0].quantity"));
    }

    #[test]
    fn test_invalid_body_message() {
        assert_eq!(ValidationError::InvalidBody.to_string(), INVALID_BODY_MESSAGE);
        assert_eq!(ValidationError::InvalidBody.field_path(), None);
    }

    #[test]
    fn test_rule_violation_messages() {
        let dup = RuleViolation::DuplicateTicketType {
            ticket_id: "vip".to_string(),
        };
        assert_eq!(dup.to_string(), "Duplicate ticket type: vip");

        let range = RuleViolation::QuantityOutOfRange {
            ticket_id: "ga".to_string(),
            min: 1,
            max: 10,
        };
        assert_eq!(range.to_string(), "Quantity must be between 1 and 10");
    }
}
