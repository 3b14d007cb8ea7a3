//! The three cache tiers.
//!
//! Each tier swallows its own storage failures: callers only ever see a hit
//! or a miss, and failures are reported through `tracing`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

use crate::entry::CacheEntry;
use crate::key::QUOTE_PREFIX;
use crate::store::{KvStore, SeriesRecord, SeriesStore, lock};

/// Process-local volatile tier.
#[derive(Debug)]
pub struct MemoryTier<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T> Default for MemoryTier<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> MemoryTier<T> {
    /// Empty tier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entry for `key`. Expired entries are dropped on the way out.
    pub fn get(&self, key: &str, now: i64) -> Option<CacheEntry<T>> {
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        }
    }

    /// Store an entry.
    pub fn insert(&self, key: String, entry: CacheEntry<T>) {
        lock(&self.entries).insert(key, entry);
    }

    /// Drop one entry.
    pub fn remove(&self, key: &str) -> bool {
        lock(&self.entries).remove(key).is_some()
    }

    /// Drop everything.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Drop expired entries, returning how many.
    pub fn sweep(&self, now: i64) -> usize {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether the tier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Durable key-value tier for quote resources.
///
/// Entries are JSON-encoded [`CacheEntry`] values under `cache:`-prefixed
/// keys, so the store can be shared with other durable data. When the store
/// reports a quota failure the oldest cache entry is evicted and the write
/// retried until it fits or nothing is left to evict.
#[derive(Debug, Clone)]
pub struct DurableTier {
    store: Arc<dyn KvStore>,
}

impl DurableTier {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Live entry for `key`. Corrupt and expired entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str, now: i64) -> Option<CacheEntry<T>> {
        let bytes = match self.store.get(key) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(key, error = %e, "durable cache read failed");
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry<T>>(&bytes) {
            Ok(entry) if entry.is_expired(now) => {
                self.discard(key);
                None
            }
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key, error = %e, "corrupt durable cache entry, removing");
                self.discard(key);
                None
            }
        }
    }

    /// Write an entry, evicting oldest entries on quota failure.
    pub fn set<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        let bytes = match serde_json::to_vec(entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "cache entry not serializable");
                return;
            }
        };

        loop {
            match self.store.put(key, &bytes) {
                Ok(()) => return,
                Err(e) if e.is_quota() => {
                    let Some(oldest) = self.oldest(key) else {
                        warn!(key, error = %e, "durable cache full, entry not stored");
                        return;
                    };
                    debug!(evicted = %oldest, "durable cache evicting oldest entry");
                    if !self.discard(&oldest) {
                        return;
                    }
                }
                Err(e) => {
                    warn!(key, error = %e, "durable cache write failed");
                    return;
                }
            }
        }
    }

    /// Drop one entry.
    pub fn remove(&self, key: &str) -> bool {
        self.discard(key)
    }

    /// Drop every cache entry, leaving non-cache keys alone.
    pub fn clear(&self) {
        for key in self.cache_keys() {
            self.discard(&key);
        }
    }

    /// Drop expired and corrupt entries, returning how many.
    pub fn sweep(&self, now: i64) -> usize {
        self.cache_keys()
            .into_iter()
            .filter(|key| match self.store.get(key) {
                Ok(Some(bytes)) => serde_json::from_slice::<CacheEntry<IgnoredAny>>(&bytes)
                    .map_or(true, |entry| entry.is_expired(now)),
                _ => false,
            })
            .filter(|key| self.discard(key))
            .count()
    }

    fn cache_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(QUOTE_PREFIX))
                .collect(),
            Err(e) => {
                warn!(error = %e, "durable cache listing failed");
                Vec::new()
            }
        }
    }

    /// Key of the entry with the earliest write time, other than `keep`.
    fn oldest(&self, keep: &str) -> Option<String> {
        self.cache_keys()
            .into_iter()
            .filter(|k| k != keep)
            .filter_map(|k| {
                let bytes = self.store.get(&k).ok()??;
                // undecodable entries sort first so they go before live data
                let timestamp = serde_json::from_slice::<CacheEntry<IgnoredAny>>(&bytes)
                    .map_or(i64::MIN, |e| e.timestamp);
                Some((timestamp, k))
            })
            .min()
            .map(|(_, k)| k)
    }

    fn discard(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(removed) => removed,
            Err(e) => {
                warn!(key, error = %e, "durable cache delete failed");
                false
            }
        }
    }
}

/// Durable structured tier for series resources.
#[derive(Debug, Clone)]
pub struct SeriesTier {
    store: Arc<dyn SeriesStore>,
}

impl SeriesTier {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: Arc<dyn SeriesStore>) -> Self {
        Self { store }
    }

    /// Live entry for `key`. Corrupt and expired records are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str, now: i64) -> Option<CacheEntry<T>> {
        let record = match self.store.get_series(key) {
            Ok(record) => record?,
            Err(e) => {
                warn!(key, error = %e, "series cache read failed, removing");
                self.discard(key);
                return None;
            }
        };
        if record.entry.is_expired(now) {
            self.discard(key);
            return None;
        }
        decode(key, record.entry).or_else(|| {
            self.discard(key);
            None
        })
    }

    /// Write a series payload.
    pub fn set<T: Serialize>(&self, ticker: &str, interval: &str, entry: &CacheEntry<T>) {
        let data = match serde_json::to_value(&entry.data) {
            Ok(data) => data,
            Err(e) => {
                warn!(ticker, interval, error = %e, "series payload not serializable");
                return;
            }
        };
        let record = SeriesRecord::new(
            ticker,
            interval,
            CacheEntry::new(data, entry.timestamp, entry.ttl),
        );
        if let Err(e) = self.store.put_series(&record) {
            warn!(ticker, interval, error = %e, "series cache write failed");
        }
    }

    /// Live entries for every interval of a ticker.
    pub fn for_ticker<T: DeserializeOwned>(&self, ticker: &str, now: i64) -> Vec<CacheEntry<T>> {
        match self.store.series_for_ticker(ticker) {
            Ok(records) => records
                .into_iter()
                .filter(|r| !r.entry.is_expired(now))
                .filter_map(|r| {
                    let key = r.key();
                    decode(&key, r.entry)
                })
                .collect(),
            Err(e) => {
                warn!(ticker, error = %e, "series cache query failed");
                Vec::new()
            }
        }
    }

    /// Drop one record.
    pub fn remove(&self, key: &str) -> bool {
        self.discard(key)
    }

    /// Drop every record.
    pub fn clear(&self) {
        if let Err(e) = self.store.clear_series() {
            warn!(error = %e, "series cache clear failed");
        }
    }

    /// Drop expired records through the expiry index.
    pub fn sweep(&self, now: i64) -> usize {
        self.store.remove_expired(now).unwrap_or_else(|e| {
            warn!(error = %e, "series cache sweep failed");
            0
        })
    }

    fn discard(&self, key: &str) -> bool {
        self.store.remove_series(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "series cache delete failed");
            false
        })
    }
}

fn decode<T: DeserializeOwned>(
    key: &str,
    entry: CacheEntry<serde_json::Value>,
) -> Option<CacheEntry<T>> {
    match serde_json::from_value(entry.data) {
        Ok(data) => Some(CacheEntry::new(data, entry.timestamp, entry.ttl)),
        Err(e) => {
            warn!(key, error = %e, "series payload has unexpected shape");
            None
        }
    }
}
