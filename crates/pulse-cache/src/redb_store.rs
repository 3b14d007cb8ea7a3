//! redb-backed durable store.
//!
//! One database file holds three tables, plus any key-value partitions
//! opened with [`RedbStore::partition`]:
//! - `kv`: flat key-value entries (cache quotes)
//! - `series`: one JSON [`SeriesRecord`] per `TICKER|interval`
//! - `series_expiry`: `{expires_at:020}|TICKER|interval` → primary key,
//!   so expired records are a prefix range scan

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use redb::{Database, ReadableTable, TableDefinition, TableHandle};

use crate::error::{Result, StorageError};
use crate::key::ticker_prefix;
use crate::store::{KvStore, SeriesRecord, SeriesStore, lock};

const KV_TABLE: TableDefinition<'static, &str, &[u8]> = TableDefinition::new("kv");
const SERIES_TABLE: TableDefinition<'static, &str, &[u8]> = TableDefinition::new("series");
const EXPIRY_TABLE: TableDefinition<'static, &str, &str> = TableDefinition::new("series_expiry");

type KvTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Durable [`KvStore`] and [`SeriesStore`] in a single redb file.
///
/// Key-value size is counted as key length plus value length, like
/// [`crate::MemoryKvStore`]. With a capacity set, writes that would exceed it
/// fail with [`StorageError::Quota`].
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
    kv: KvTable,
    capacity: Option<usize>,
    used: Mutex<usize>,
}

impl fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .field("kv", &self.kv.name())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

fn expiry_key(expires_at: i64, key: &str) -> String {
    format!("{:020}|{key}", expires_at.max(0))
}

impl RedbStore {
    /// Open or create the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Unavailable(format!("{}: {e}", parent.display())))?;
        }
        let db = Database::create(&path).map_err(StorageError::backend)?;

        // create tables up front so readers never see a missing table
        let txn = db.begin_write().map_err(StorageError::backend)?;
        {
            txn.open_table(KV_TABLE).map_err(StorageError::backend)?;
            txn.open_table(SERIES_TABLE).map_err(StorageError::backend)?;
            txn.open_table(EXPIRY_TABLE).map_err(StorageError::backend)?;
        }
        txn.commit().map_err(StorageError::backend)?;

        Self::with_table(Arc::new(db), path, KV_TABLE)
    }

    /// Key-value view over its own table `name` in the same file, sharing
    /// the series tables. The view starts without a capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the table cannot be created.
    pub fn partition(&self, name: &'static str) -> Result<Self> {
        let table: KvTable = TableDefinition::new(name);
        let txn = self.db.begin_write().map_err(StorageError::backend)?;
        txn.open_table(table).map_err(StorageError::backend)?;
        txn.commit().map_err(StorageError::backend)?;
        Self::with_table(Arc::clone(&self.db), self.path.clone(), table)
    }

    /// Reject key-value writes that would take the table past `bytes`.
    #[must_use]
    pub fn with_capacity(mut self, bytes: usize) -> Self {
        self.capacity = Some(bytes);
        self
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes held in the key-value table.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        *lock(&self.used)
    }

    fn with_table(db: Arc<Database>, path: PathBuf, kv: KvTable) -> Result<Self> {
        let used = {
            let txn = db.begin_read().map_err(StorageError::backend)?;
            let table = txn.open_table(kv).map_err(StorageError::backend)?;
            let mut used = 0;
            for item in table.range::<&str>(..).map_err(StorageError::backend)? {
                let (key, value) = item.map_err(StorageError::backend)?;
                used += key.value().len() + value.value().len();
            }
            used
        };
        Ok(Self {
            db,
            path,
            kv,
            capacity: None,
            used: Mutex::new(used),
        })
    }
}

impl KvStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(StorageError::backend)?;
        let table = txn.open_table(self.kv).map_err(StorageError::backend)?;
        let value = table.get(key).map_err(StorageError::backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        // held across the transaction so the count matches the table
        let mut used = lock(&self.used);
        let txn = self.db.begin_write().map_err(StorageError::backend)?;
        let total = {
            let mut table = txn.open_table(self.kv).map_err(StorageError::backend)?;
            let freed = table
                .get(key)
                .map_err(StorageError::backend)?
                .map_or(0, |old| key.len() + old.value().len());
            let needed = key.len() + value.len();
            let base = *used - freed;
            if let Some(capacity) = self.capacity.filter(|&c| base + needed > c) {
                return Err(StorageError::Quota {
                    needed,
                    available: capacity.saturating_sub(base),
                });
            }
            table.insert(key, value).map_err(StorageError::backend)?;
            base + needed
        };
        txn.commit().map_err(StorageError::backend)?;
        *used = total;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut used = lock(&self.used);
        let txn = self.db.begin_write().map_err(StorageError::backend)?;
        let freed = {
            let mut table = txn.open_table(self.kv).map_err(StorageError::backend)?;
            let old = table.remove(key).map_err(StorageError::backend)?;
            old.map(|v| key.len() + v.value().len())
        };
        txn.commit().map_err(StorageError::backend)?;
        if let Some(freed) = freed {
            *used -= freed;
        }
        Ok(freed.is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let txn = self.db.begin_read().map_err(StorageError::backend)?;
        let table = txn.open_table(self.kv).map_err(StorageError::backend)?;
        let mut keys = Vec::new();
        for item in table.range::<&str>(..).map_err(StorageError::backend)? {
            let (key, _) = item.map_err(StorageError::backend)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

impl SeriesStore for RedbStore {
    fn get_series(&self, key: &str) -> Result<Option<SeriesRecord>> {
        let txn = self.db.begin_read().map_err(StorageError::backend)?;
        let table = txn.open_table(SERIES_TABLE).map_err(StorageError::backend)?;
        let value = table.get(key).map_err(StorageError::backend)?;
        value
            .map(|v| SeriesRecord::decode(key, v.value()))
            .transpose()
    }

    fn put_series(&self, record: &SeriesRecord) -> Result<()> {
        let key = record.key();
        let bytes = serde_json::to_vec(record)?;

        let txn = self.db.begin_write().map_err(StorageError::backend)?;
        {
            let mut series = txn.open_table(SERIES_TABLE).map_err(StorageError::backend)?;
            let mut expiry = txn.open_table(EXPIRY_TABLE).map_err(StorageError::backend)?;

            let previous = series
                .get(key.as_str())
                .map_err(StorageError::backend)?
                .map(|v| v.value().to_vec());
            if let Some(old) = previous.and_then(|b| SeriesRecord::decode(&key, &b).ok()) {
                let stale = expiry_key(old.entry.expires_at(), &key);
                expiry.remove(stale.as_str()).map_err(StorageError::backend)?;
            }

            series
                .insert(key.as_str(), bytes.as_slice())
                .map_err(StorageError::backend)?;
            let index = expiry_key(record.entry.expires_at(), &key);
            expiry
                .insert(index.as_str(), key.as_str())
                .map_err(StorageError::backend)?;
        }
        txn.commit().map_err(StorageError::backend)
    }

    fn remove_series(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write().map_err(StorageError::backend)?;
        let removed = {
            let mut series = txn.open_table(SERIES_TABLE).map_err(StorageError::backend)?;
            let mut expiry = txn.open_table(EXPIRY_TABLE).map_err(StorageError::backend)?;
            let old = series
                .remove(key)
                .map_err(StorageError::backend)?
                .map(|v| v.value().to_vec());
            if let Some(record) = old.as_deref().and_then(|b| SeriesRecord::decode(key, b).ok()) {
                let index = expiry_key(record.entry.expires_at(), key);
                expiry.remove(index.as_str()).map_err(StorageError::backend)?;
            }
            old.is_some()
        };
        txn.commit().map_err(StorageError::backend)?;
        Ok(removed)
    }

    fn series_for_ticker(&self, ticker: &str) -> Result<Vec<SeriesRecord>> {
        let prefix = ticker_prefix(ticker);
        let txn = self.db.begin_read().map_err(StorageError::backend)?;
        let table = txn.open_table(SERIES_TABLE).map_err(StorageError::backend)?;

        let mut records = Vec::new();
        for item in table
            .range::<&str>(prefix.as_str()..)
            .map_err(StorageError::backend)?
        {
            let (key, value) = item.map_err(StorageError::backend)?;
            let key = key.value();
            if !key.starts_with(&prefix) {
                break;
            }
            match SeriesRecord::decode(key, value.value()) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, "skipping corrupt series record"),
            }
        }
        Ok(records)
    }

    fn remove_expired(&self, now: i64) -> Result<usize> {
        // entries expiring strictly before `now` sort below this bound
        let bound = format!("{:020}", now.max(0));

        let txn = self.db.begin_write().map_err(StorageError::backend)?;
        let removed = {
            let mut series = txn.open_table(SERIES_TABLE).map_err(StorageError::backend)?;
            let mut expiry = txn.open_table(EXPIRY_TABLE).map_err(StorageError::backend)?;

            let mut expired = Vec::new();
            for item in expiry
                .range::<&str>(..bound.as_str())
                .map_err(StorageError::backend)?
            {
                let (index, key) = item.map_err(StorageError::backend)?;
                expired.push((index.value().to_string(), key.value().to_string()));
            }

            for (index, key) in &expired {
                expiry.remove(index.as_str()).map_err(StorageError::backend)?;
                series.remove(key.as_str()).map_err(StorageError::backend)?;
            }
            expired.len()
        };
        txn.commit().map_err(StorageError::backend)?;
        Ok(removed)
    }

    fn clear_series(&self) -> Result<()> {
        let txn = self.db.begin_write().map_err(StorageError::backend)?;
        txn.delete_table(SERIES_TABLE).map_err(StorageError::backend)?;
        txn.delete_table(EXPIRY_TABLE).map_err(StorageError::backend)?;
        txn.open_table(SERIES_TABLE).map_err(StorageError::backend)?;
        txn.open_table(EXPIRY_TABLE).map_err(StorageError::backend)?;
        txn.commit().map_err(StorageError::backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::CacheEntry;
    use serde_json::json;
    use tempfile::TempDir;

    fn open() -> (TempDir, RedbStore) {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(dir.path().join("pulse.redb")).unwrap();
        (dir, store)
    }

    fn record(ticker: &str, interval: &str, timestamp: i64, ttl: i64) -> SeriesRecord {
        SeriesRecord::new(
            ticker,
            interval,
            CacheEntry::new(json!([1.0, 2.0]), timestamp, ttl),
        )
    }

    #[test]
    fn test_kv_roundtrip_and_keys() {
        let (_dir, store) = open();
        store.put("b", b"2").unwrap();
        store.put("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some(&b"1"[..]));
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);
        assert!(store.remove("a").unwrap());
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_kv_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pulse.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.put("score_history", b"[]").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(
            store.get("score_history").unwrap().as_deref(),
            Some(&b"[]"[..])
        );
    }

    #[test]
    fn test_kv_capacity_counts_existing_bytes_after_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pulse.redb");
        {
            let store = RedbStore::open(&path).unwrap().with_capacity(10);
            store.put("k", b"12345").unwrap();
            let err = store.put("j", b"123456").unwrap_err();
            assert!(matches!(
                err,
                StorageError::Quota {
                    needed: 7,
                    available: 4
                }
            ));
            // replacing a key only counts the difference
            store.put("k", b"123456789").unwrap();
            assert_eq!(store.used_bytes(), 10);
        }

        let store = RedbStore::open(&path).unwrap().with_capacity(10);
        assert_eq!(store.used_bytes(), 10);
        assert!(store.put("j", b"1").unwrap_err().is_quota());
        assert!(store.remove("k").unwrap());
        assert_eq!(store.used_bytes(), 0);
        store.put("j", b"1").unwrap();
    }

    #[test]
    fn test_partition_has_own_table_and_budget() {
        let (_dir, store) = open();
        let store = store.with_capacity(4);
        let history = store.partition("history").unwrap();

        store.put("a", b"123").unwrap();
        history.put("a", b"a much longer value").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some(&b"123"[..]));
        assert_eq!(store.used_bytes(), 4);
        assert_eq!(history.keys().unwrap(), vec!["a"]);

        assert!(history.remove("a").unwrap());
        assert_eq!(store.get("a").unwrap().as_deref(), Some(&b"123"[..]));
    }

    #[test]
    fn test_series_ticker_index() {
        let (_dir, store) = open();
        store.put_series(&record("spy", "1d", 0, 1_000)).unwrap();
        store.put_series(&record("spy", "1wk", 0, 1_000)).unwrap();
        store.put_series(&record("spyg", "1d", 0, 1_000)).unwrap();

        let spy = store.series_for_ticker("SPY").unwrap();
        let intervals: Vec<_> = spy.iter().map(|r| r.interval.as_str()).collect();
        assert_eq!(intervals, vec!["1d", "1wk"]);
    }

    #[test]
    fn test_series_expiry_index() {
        let (_dir, store) = open();
        store.put_series(&record("spy", "1d", 0, 1_000)).unwrap();
        store.put_series(&record("hyg", "1d", 0, 5_000)).unwrap();

        assert_eq!(store.remove_expired(1_000).unwrap(), 0);
        assert_eq!(store.remove_expired(1_001).unwrap(), 1);
        assert!(store.get_series("SPY|1d").unwrap().is_none());
        assert!(store.get_series("HYG|1d").unwrap().is_some());
    }

    #[test]
    fn test_series_rewrite_moves_expiry() {
        let (_dir, store) = open();
        store.put_series(&record("spy", "1d", 0, 1_000)).unwrap();
        // refreshed later with a new expiry
        store.put_series(&record("spy", "1d", 2_000, 1_000)).unwrap();

        assert_eq!(store.remove_expired(1_500).unwrap(), 0);
        assert!(store.get_series("SPY|1d").unwrap().is_some());
        assert_eq!(store.remove_expired(3_500).unwrap(), 1);
    }

    #[test]
    fn test_clear_and_remove() {
        let (_dir, store) = open();
        store.put_series(&record("spy", "1d", 0, 1_000)).unwrap();
        assert!(store.remove_series("SPY|1d").unwrap());
        assert!(!store.remove_series("SPY|1d").unwrap());

        store.put_series(&record("spy", "1d", 0, 1_000)).unwrap();
        store.clear_series().unwrap();
        assert!(store.series_for_ticker("spy").unwrap().is_empty());
        assert_eq!(store.remove_expired(i64::MAX).unwrap(), 0);
    }
}
