//! Rate limiting for the Atrium gateway.
//!
//! This crate bounds the number of requests a client may make to a route
//! within a time window, using fixed-window counting: one counter and one
//! deadline per active (client, route) key, replaced wholesale when the
//! window lapses. Rejected attempts consume a slot too, so a retry storm
//! cannot reset its own window.
//!
//! Enforcement is per process and in memory. In a multi-instance deployment
//! each instance applies its own independent limit; that is a stated
//! limitation, not a bug. A fixed window also admits a burst of up to twice
//! the limit clustered around a window boundary, which is accepted behavior.

#![deny(missing_docs)]

mod error;
mod manager;
mod request;
mod storage;

pub use error::RateLimitError;
pub use manager::{RateLimitDecision, RateLimitManager};
pub use request::{RateLimitRequest, RateLimitRequestBuilder};
pub use storage::{InMemoryStorage, RateLimitResult, RateLimitStorage};
