//! Error types for rate limiting.

use std::time::Duration;

/// Errors that can occur during rate limiting.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// The quota for a (client, route) pair is exhausted.
    #[error("Rate limit exceeded for {route}")]
    RouteLimitExceeded {
        /// The route whose quota was exhausted.
        route: String,
        /// Time until the current window lapses and the counter resets.
        retry_after: Duration,
    },
}

impl RateLimitError {
    /// Get the retry-after duration.
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::RouteLimitExceeded { retry_after, .. } => *retry_after,
        }
    }
}
