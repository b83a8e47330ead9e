//! HTTP request handlers.
//!
//! Handlers take the raw body as `Bytes` rather than `Json<T>`: the body is
//! validated by the gate, which reports the first violated constraint in its
//! own words instead of axum's rejection text.

pub mod health;
pub mod orders;
pub mod waitlist;

pub use health::health_check;
pub use orders::create_order;
pub use waitlist::join_waitlist;
