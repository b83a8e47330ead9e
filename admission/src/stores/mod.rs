//! Rate limit store implementations.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::{ClientWindowRecord, MemoryRateLimitStore};
#[cfg(feature = "redis")]
pub use self::redis::RedisRateLimitStore;
