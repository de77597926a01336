//! Storage backends for rate limiting.

use std::time::Duration;

pub mod memory;

pub use memory::InMemoryStorage;

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitResult {
    /// Whether the request is within the quota.
    pub allowed: bool,
    /// Number of requests left in the current window.
    pub remaining: u32,
    /// Time until the current window lapses and the counter resets.
    pub reset_after: Duration,
}

/// Trait for rate limit storage backends.
///
/// The store is the swap seam for a future distributed backend: the manager
/// and the HTTP middleware only ever talk to this interface.
#[allow(async_fn_in_trait)]
pub trait RateLimitStorage: Send + Sync {
    /// Record an attempt against the key's current window and report whether
    /// it fits the quota.
    ///
    /// The attempt is recorded whether or not it is allowed.
    async fn check_and_consume(&self, key: &str, limit: u32, window: Duration) -> RateLimitResult;

    /// Remove entries whose window has already lapsed, returning how many
    /// were evicted. Calling this with no elapsed time is a no-op.
    async fn evict_expired(&self) -> usize;
}
