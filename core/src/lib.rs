//! # Ticketgate Core
//!
//! Domain types and pure validation logic for ticket order intake.
//!
//! Everything in this crate is free of I/O: it turns an untrusted JSON payload
//! into an immutable, verified intent that downstream services can rely on.
//!
//! ## Pipeline
//!
//! ```text
//! raw body ──▶ schema::validate_order ──▶ OrderRequest ──▶ OrderRules::assemble ──▶ OrderIntent
//! raw body ──▶ schema::validate_waitlist ─────────────────────────────────────────▶ WaitlistIntent
//! ```
//!
//! - **Schema validation** checks shape and types, reporting the *first*
//!   violated constraint in field-declaration order.
//! - **Business rules** check cross-field invariants (duplicate ticket types,
//!   per-order totals). They run only on schema-valid input.
//!
//! ## Example
//!
//! ```
//! use ticketgate_core::{schema, rules::OrderRules, PaymentMethod};
//!
//! let body = br#"{
//!     "eventId": "evt-1",
//!     "tickets": [{ "ticketId": "vip", "quantity": 2 }],
//!     "userEmail": "a@b.com"
//! }"#;
//!
//! let request = schema::validate_order(body).unwrap();
//! let intent = OrderRules::default().assemble(request).unwrap();
//!
//! assert_eq!(intent.payment_method(), PaymentMethod::Card);
//! assert_eq!(intent.total_tickets(), 2);
//! ```

pub mod error;
pub mod intake;
pub mod rules;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{IntakeError, RuleViolation, ValidationError};
pub use intake::{InMemoryIntakeService, IntakeService, OrderReceipt, WaitlistReceipt};
pub use rules::OrderRules;
pub use schema::Schema;
pub use types::{OrderIntent, OrderRequest, PaymentMethod, TicketLineItem, WaitlistIntent};

/// Environment module - injected dependencies
///
/// External concerns that would make admission decisions non-deterministic
/// (currently only time) are abstracted behind traits so tests can control them.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use ticketgate_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}
