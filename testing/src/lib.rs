//! # Ticketgate Testing
//!
//! Testing utilities and helpers for ticketgate.
//!
//! This crate provides:
//! - Deterministic clocks for admission control tests
//! - Intake service doubles that capture or reject intents
//! - JSON payload fixtures for order and waitlist requests
//!
//! ## Example
//!
//! ```
//! use ticketgate_testing::mocks::{ManualClock, test_clock};
//! use ticketgate_core::environment::Clock;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(test_clock().now());
//! let start = clock.now();
//! clock.advance(Duration::from_secs(61));
//! assert_eq!((clock.now() - start).num_seconds(), 61);
//! ```

use chrono::{DateTime, Utc};
use ticketgate_core::environment::Clock;

/// Mock implementations of environment traits and collaborators.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;
    use ticketgate_core::{
        IntakeError, IntakeService, OrderIntent, OrderReceipt, WaitlistIntent, WaitlistReceipt,
    };
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticketgate_testing::mocks::FixedClock;
    /// use ticketgate_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the code under test.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let by = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to a specific time.
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Intake service that records every intent it receives.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingIntakeService {
        orders: Arc<Mutex<Vec<OrderIntent>>>,
        waitlist: Arc<Mutex<Vec<WaitlistIntent>>>,
    }

    impl RecordingIntakeService {
        /// Create an empty recorder.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Orders received so far, in arrival order.
        #[must_use]
        pub fn orders(&self) -> Vec<OrderIntent> {
            self.orders
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Waitlist entries received so far, in arrival order.
        #[must_use]
        pub fn waitlist(&self) -> Vec<WaitlistIntent> {
            self.waitlist
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl IntakeService for RecordingIntakeService {
        async fn create_order(&self, intent: OrderIntent) -> Result<OrderReceipt, IntakeError> {
            let receipt = OrderReceipt {
                order_id: Uuid::new_v4(),
                event_id: intent.event_id().to_string(),
                total_tickets: intent.total_tickets(),
                payment_method: intent.payment_method(),
                status: "pending".to_string(),
                created_at: Utc::now(),
            };
            self.orders
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(intent);
            Ok(receipt)
        }

        async fn join_waitlist(
            &self,
            intent: WaitlistIntent,
        ) -> Result<WaitlistReceipt, IntakeError> {
            let receipt = WaitlistReceipt {
                entry_id: Uuid::new_v4(),
                event_id: intent.event_id().to_string(),
                status: "waiting".to_string(),
                created_at: Utc::now(),
            };
            self.waitlist
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(intent);
            Ok(receipt)
        }
    }

    /// Intake service whose backend is always down.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FailingIntakeService;

    #[async_trait]
    impl IntakeService for FailingIntakeService {
        async fn create_order(&self, _intent: OrderIntent) -> Result<OrderReceipt, IntakeError> {
            Err(IntakeError::Unavailable("orders database offline".to_string()))
        }

        async fn join_waitlist(
            &self,
            _intent: WaitlistIntent,
        ) -> Result<WaitlistReceipt, IntakeError> {
            Err(IntakeError::Internal("waitlist queue rejected write".to_string()))
        }
    }
}

/// JSON request fixtures.
pub mod fixtures {
    use serde_json::{Value, json};

    /// A valid order body: one line of two general tickets, no payment method.
    #[must_use]
    pub fn order_json() -> Value {
        json!({
            "eventId": "evt-2025-jazz",
            "tickets": [{ "ticketId": "general", "quantity": 2 }],
            "userEmail": "a@b.com",
            "userName": "Ada Lovelace",
        })
    }

    /// A valid waitlist body with an international phone number.
    #[must_use]
    pub fn waitlist_json() -> Value {
        json!({
            "eventId": "evt-2025-jazz",
            "ticketId": "vip",
            "email": "fan@example.com",
            "phone": "+919876543210",
        })
    }

    /// Copy of `base` with `overrides` merged over its top-level keys.
    #[must_use]
    pub fn with(base: Value, overrides: &Value) -> Value {
        let mut base = base;
        if let (Value::Object(target), Value::Object(extra)) = (&mut base, overrides) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        base
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, RecordingIntakeService, test_clock};
