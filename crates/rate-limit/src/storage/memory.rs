//! In-memory fixed-window rate limit storage.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use super::{RateLimitResult, RateLimitStorage};

/// One (client, route) counting window.
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// In-memory rate limit storage.
///
/// One entry per active key, O(1) memory, created lazily on first request
/// and replaced (not merged) once the window lapses. Concurrent increments
/// for the same key serialize on the dashmap entry lock; across keys there
/// is no coordination at all.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    windows: DashMap<String, WindowEntry>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage instance.
    pub fn new() -> Self {
        Self { windows: DashMap::new() }
    }

    /// Number of live window entries.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether the store holds no window entries.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl RateLimitStorage for InMemoryStorage {
    async fn check_and_consume(&self, key: &str, limit: u32, window: Duration) -> RateLimitResult {
        let now = Instant::now();

        let mut entry = self.windows.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            reset_at: now + window,
        });

        // A lapsed window is replaced wholesale, never merged.
        if now > entry.reset_at {
            *entry = WindowEntry {
                count: 0,
                reset_at: now + window,
            };
        }

        // Rejected attempts count too: retries past the limit must not be
        // able to hold a fresh window open.
        entry.count += 1;

        RateLimitResult {
            allowed: entry.count <= limit,
            remaining: limit.saturating_sub(entry.count),
            reset_after: entry.reset_at.saturating_duration_since(now),
        }
    }

    async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();

        self.windows.retain(|_, entry| entry.reset_at >= now);

        before.saturating_sub(self.windows.len())
    }
}
