//! Cache entry with time-to-live.

use serde::{Deserialize, Serialize};

/// A cached value stamped with its write time and TTL, both in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Cached payload.
    pub data: T,
    /// Write time, ms since the Unix epoch.
    pub timestamp: i64,
    /// Validity duration in ms.
    pub ttl: i64,
}

impl<T> CacheEntry<T> {
    /// Create an entry.
    pub const fn new(data: T, timestamp: i64, ttl: i64) -> Self {
        Self {
            data,
            timestamp,
            ttl,
        }
    }

    /// Expired when strictly more than `ttl` has elapsed since the write.
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.timestamp) > self.ttl
    }

    /// Last instant at which the entry is still valid.
    #[must_use]
    pub const fn expires_at(&self) -> i64 {
        self.timestamp.saturating_add(self.ttl)
    }

    /// Validity left at `now`, never negative.
    #[must_use]
    pub const fn remaining(&self, now: i64) -> i64 {
        let left = self.expires_at().saturating_sub(now);
        if left < 0 { 0 } else { left }
    }
}
