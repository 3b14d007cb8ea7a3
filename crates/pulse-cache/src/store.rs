//! Storage substrates behind the durable tiers.
//!
//! [`KvStore`] is a flat byte store with bounded capacity; [`SeriesStore`]
//! holds one [`SeriesRecord`] per (ticker, interval) with a ticker index and
//! an expiry index. Both are synchronous: every call is a short critical
//! section or a single embedded-database transaction.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::CacheEntry;
use crate::error::{Result, StorageError};
use crate::key::{series_key, ticker_prefix};

/// Durable byte store keyed by string.
pub trait KvStore: Send + Sync + Debug {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the backend fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Quota`] if the write does not fit.
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the backend fails.
    fn remove(&self, key: &str) -> Result<bool>;

    /// All keys in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the backend fails.
    fn keys(&self) -> Result<Vec<String>>;
}

/// One cached time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    /// Upper-cased ticker.
    pub ticker: String,
    /// Sampling interval label.
    pub interval: String,
    /// Payload with its write time and TTL.
    pub entry: CacheEntry<Value>,
}

impl SeriesRecord {
    /// Create a record; the ticker is upper-cased.
    #[must_use]
    pub fn new(ticker: &str, interval: impl Into<String>, entry: CacheEntry<Value>) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            interval: interval.into(),
            entry,
        }
    }

    /// Primary key, `TICKER|interval`.
    #[must_use]
    pub fn key(&self) -> String {
        series_key(&self.ticker, &self.interval)
    }

    pub(crate) fn decode(key: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Structured store for series payloads.
pub trait SeriesStore: Send + Sync + Debug {
    /// Read one record by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the stored record cannot be decoded.
    fn get_series(&self, key: &str) -> Result<Option<SeriesRecord>>;

    /// Insert or replace a record, keeping the expiry index in step.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_series(&self, record: &SeriesRecord) -> Result<()>;

    /// Delete one record, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn remove_series(&self, key: &str) -> Result<bool>;

    /// Every record for a ticker, ordered by interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn series_for_ticker(&self, ticker: &str) -> Result<Vec<SeriesRecord>>;

    /// Delete records whose TTL has elapsed at `now`, returning how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn remove_expired(&self, now: i64) -> Result<usize>;

    /// Delete every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn clear_series(&self) -> Result<()>;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct KvState {
    entries: BTreeMap<String, Vec<u8>>,
    used: usize,
    available: bool,
}

/// In-process [`KvStore`] with an optional byte budget.
///
/// Size is counted as key length plus value length. Used when no data
/// directory is configured, and in tests.
#[derive(Debug)]
pub struct MemoryKvStore {
    state: Mutex<KvState>,
    capacity: Option<usize>,
}

impl MemoryKvStore {
    /// Unbounded store.
    #[must_use]
    pub const fn new() -> Self {
        Self::build(None)
    }

    /// Store that rejects writes beyond `bytes`.
    #[must_use]
    pub const fn with_capacity(bytes: usize) -> Self {
        Self::build(Some(bytes))
    }

    const fn build(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(KvState {
                entries: BTreeMap::new(),
                used: 0,
                available: true,
            }),
            capacity,
        }
    }

    /// Enable or disable the store. A disabled store fails every call with
    /// [`StorageError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }

    /// Bytes currently stored.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        lock(&self.state).used
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable() -> StorageError {
    StorageError::Unavailable("store disabled".into())
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let state = lock(&self.state);
        if !state.available {
            return Err(unavailable());
        }
        Ok(state.entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(unavailable());
        }
        let freed = state.entries.get(key).map_or(0, |old| key.len() + old.len());
        let needed = key.len() + value.len();
        let base = state.used - freed;
        if let Some(capacity) = self.capacity.filter(|&c| base + needed > c) {
            return Err(StorageError::Quota {
                needed,
                available: capacity.saturating_sub(base),
            });
        }
        state.entries.insert(key.to_string(), value.to_vec());
        state.used = base + needed;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(unavailable());
        }
        match state.entries.remove(key) {
            Some(old) => {
                state.used -= key.len() + old.len();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let state = lock(&self.state);
        if !state.available {
            return Err(unavailable());
        }
        Ok(state.entries.keys().cloned().collect())
    }
}

/// In-process [`SeriesStore`].
#[derive(Debug, Default)]
pub struct MemorySeriesStore {
    records: Mutex<BTreeMap<String, SeriesRecord>>,
}

impl MemorySeriesStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeriesStore for MemorySeriesStore {
    fn get_series(&self, key: &str) -> Result<Option<SeriesRecord>> {
        Ok(lock(&self.records).get(key).cloned())
    }

    fn put_series(&self, record: &SeriesRecord) -> Result<()> {
        lock(&self.records).insert(record.key(), record.clone());
        Ok(())
    }

    fn remove_series(&self, key: &str) -> Result<bool> {
        Ok(lock(&self.records).remove(key).is_some())
    }

    fn series_for_ticker(&self, ticker: &str) -> Result<Vec<SeriesRecord>> {
        let prefix = ticker_prefix(ticker);
        Ok(lock(&self.records)
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn remove_expired(&self, now: i64) -> Result<usize> {
        let mut records = lock(&self.records);
        let before = records.len();
        records.retain(|_, r| !r.entry.is_expired(now));
        Ok(before - records.len())
    }

    fn clear_series(&self) -> Result<()> {
        lock(&self.records).clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_kv_roundtrip() {
        let store = MemoryKvStore::new();
        store.put("a", b"one").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some(&b"one"[..]));
        assert_eq!(store.used_bytes(), 4);
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn test_memory_kv_quota() {
        let store = MemoryKvStore::with_capacity(10);
        store.put("k", b"12345").unwrap();
        let err = store.put("j", b"123456").unwrap_err();
        assert!(matches!(
            err,
            StorageError::Quota {
                needed: 7,
                available: 4
            }
        ));
        // replacing an existing key only counts the difference
        store.put("k", b"123456789").unwrap();
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_memory_kv_unavailable() {
        let store = MemoryKvStore::new();
        store.put("a", b"1").unwrap();
        store.set_available(false);
        assert!(matches!(store.get("a"), Err(StorageError::Unavailable(_))));
        assert!(store.put("b", b"2").is_err());
        store.set_available(true);
        assert!(store.get("a").unwrap().is_some());
    }

    #[test]
    fn test_memory_series_by_ticker_and_expiry() {
        let store = MemorySeriesStore::new();
        let record = |ticker: &str, interval: &str, ts: i64| {
            SeriesRecord::new(ticker, interval, CacheEntry::new(Value::Null, ts, 100))
        };
        store.put_series(&record("spy", "1d", 0)).unwrap();
        store.put_series(&record("SPY", "1wk", 1_000)).unwrap();
        store.put_series(&record("SPYG", "1d", 1_000)).unwrap();

        let spy = store.series_for_ticker("spy").unwrap();
        assert_eq!(spy.len(), 2);
        assert!(spy.iter().all(|r| r.ticker == "SPY"));

        assert_eq!(store.remove_expired(500).unwrap(), 1);
        assert!(store.get_series("SPY|1d").unwrap().is_none());
        assert!(store.get_series("SPY|1wk").unwrap().is_some());
    }
}
