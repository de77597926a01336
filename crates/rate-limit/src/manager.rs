//! Rate limit manager implementation.

use std::{sync::Arc, time::Duration};

use config::{RateLimitConfig, RateLimitQuota};
use tokio_util::sync::CancellationToken;

use crate::error::RateLimitError;
use crate::request::RateLimitRequest;
use crate::storage::{InMemoryStorage, RateLimitStorage};

/// Decision record for an admitted request.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Number of requests left in the current window.
    pub remaining: u32,
    /// Time until the current window lapses.
    pub reset_after: Duration,
}

/// Manager owning the rate limit store and the quota presets.
///
/// The store is process-wide state; the manager gives it an explicit
/// lifecycle (construction, sweep start, sweep teardown) instead of a
/// module-level map with an on-load timer.
pub struct RateLimitManager {
    config: Arc<RateLimitConfig>,
    storage: InMemoryStorage,
}

impl RateLimitManager {
    /// Create a new rate limit manager with an empty in-memory store.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config: Arc::new(config),
            storage: InMemoryStorage::new(),
        }
    }

    /// Select the quota preset for a request path.
    ///
    /// Sensitive endpoints are checked before auth endpoints, and anything
    /// unmatched is billed against the permissive default preset.
    pub fn quota_for(&self, path: &str) -> &RateLimitQuota {
        if self.config.sensitive_paths.iter().any(|prefix| matches_prefix(path, prefix)) {
            &self.config.sensitive
        } else if self.config.auth_paths.iter().any(|prefix| matches_prefix(path, prefix)) {
            &self.config.auth
        } else {
            &self.config.default
        }
    }

    /// Check the quota for a request, consuming one attempt from its window.
    pub async fn check_request(&self, request: &RateLimitRequest) -> Result<RateLimitDecision, RateLimitError> {
        let quota = self.quota_for(&request.route);

        let result = self
            .storage
            .check_and_consume(&request.key(), quota.limit, quota.duration)
            .await;

        if !result.allowed {
            log::debug!(
                "rate limit exceeded for {} on {} (window resets in {:?})",
                request.client_addr,
                request.route,
                result.reset_after
            );

            return Err(RateLimitError::RouteLimitExceeded {
                route: request.route.clone(),
                retry_after: result.reset_after,
            });
        }

        Ok(RateLimitDecision {
            remaining: result.remaining,
            reset_after: result.reset_after,
        })
    }

    /// Spawn the background sweep that evicts lapsed windows.
    ///
    /// The sweep bounds memory growth from abandoned keys (one-off scanner
    /// addresses that never return to trigger the inline replacement). It
    /// runs independently of request traffic and stops when the token is
    /// cancelled; the returned handle completes once the task has exited.
    pub fn start_sweep(self: &Arc<Self>, cancellation: CancellationToken) -> tokio::task::JoinHandle<()> {
        let manager = self.clone();
        let interval = manager.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately and sweeps an empty store.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = manager.storage.evict_expired().await;

                        if evicted > 0 {
                            log::debug!("rate limit sweep evicted {evicted} expired entries");
                        }
                    }
                    _ = cancellation.cancelled() => {
                        log::debug!("rate limit sweep stopped");
                        break;
                    }
                }
            }
        })
    }

    /// The backing store. Exposed for inspection in tests.
    pub fn storage(&self) -> &InMemoryStorage {
        &self.storage
    }
}

/// Segment-aware prefix match, mirroring the route classification rules.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
