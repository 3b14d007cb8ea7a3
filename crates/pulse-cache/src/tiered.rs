//! The tiered cache front end.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use pulse_traits::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::entry::CacheEntry;
use crate::key::CacheKey;
use crate::store::{KvStore, SeriesStore};
use crate::tier::{DurableTier, MemoryTier, SeriesTier};

/// Default TTL of the volatile tier.
pub const DEFAULT_MEMORY_TTL: Duration = Duration::from_secs(60);

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Three-tier cache: volatile memory, then a durable key-value store for
/// quotes, or a durable structured store for series.
///
/// Reads fall through the tiers and promote durable hits into memory with
/// their remaining TTL. Writes go to memory and to the durable tier for the
/// key's resource kind. No operation returns an error.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use pulse_cache::{CacheKey, MemoryKvStore, TieredCache};
/// use pulse_traits::SystemClock;
///
/// let cache: TieredCache<f64> = TieredCache::new(Arc::new(SystemClock))
///     .with_durable(Arc::new(MemoryKvStore::new()));
///
/// let key = CacheKey::quote("vix_level");
/// cache.set(&key, 14.2, Duration::from_secs(300));
/// assert_eq!(cache.get(&key), Some(14.2));
/// ```
pub struct TieredCache<T> {
    memory: MemoryTier<T>,
    durable: Option<DurableTier>,
    series: Option<SeriesTier>,
    clock: Arc<dyn Clock>,
    memory_ttl: Duration,
}

impl<T> fmt::Debug for TieredCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCache")
            .field("durable", &self.durable.is_some())
            .field("series", &self.series.is_some())
            .field("memory_ttl", &self.memory_ttl)
            .finish_non_exhaustive()
    }
}

impl<T> TieredCache<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Memory-only cache.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: MemoryTier::new(),
            durable: None,
            series: None,
            clock,
            memory_ttl: DEFAULT_MEMORY_TTL,
        }
    }

    /// Attach the durable key-value tier.
    #[must_use]
    pub fn with_durable(mut self, store: Arc<dyn KvStore>) -> Self {
        self.durable = Some(DurableTier::new(store));
        self
    }

    /// Attach the durable structured tier.
    #[must_use]
    pub fn with_series(mut self, store: Arc<dyn SeriesStore>) -> Self {
        self.series = Some(SeriesTier::new(store));
        self
    }

    /// Cap on how long an entry stays in memory.
    #[must_use]
    pub const fn with_memory_ttl(mut self, ttl: Duration) -> Self {
        self.memory_ttl = ttl;
        self
    }

    /// Freshest live value for `key`, if any tier has one.
    pub fn get(&self, key: &CacheKey) -> Option<T> {
        let now = self.clock.now_millis();
        let storage_key = key.storage_key();

        if let Some(entry) = self.memory.get(&storage_key, now) {
            debug!(key = %key, tier = "memory", "cache hit");
            return Some(entry.data);
        }

        let durable = match key {
            CacheKey::Quote(_) => self
                .durable
                .as_ref()
                .and_then(|tier| tier.get::<T>(&storage_key, now)),
            CacheKey::Series { .. } => self
                .series
                .as_ref()
                .and_then(|tier| tier.get::<T>(&storage_key, now)),
        };

        match durable {
            Some(entry) => {
                debug!(key = %key, tier = "durable", remaining_ms = entry.remaining(now), "cache hit");
                let promoted = CacheEntry::new(entry.data.clone(), now, entry.remaining(now));
                self.memory.insert(storage_key, promoted);
                Some(entry.data)
            }
            None => {
                debug!(key = %key, "cache miss");
                None
            }
        }
    }

    /// Write through memory and the applicable durable tier.
    pub fn set(&self, key: &CacheKey, value: T, ttl: Duration) {
        let now = self.clock.now_millis();
        let ttl_ms = millis(ttl);
        let storage_key = key.storage_key();

        let entry = CacheEntry::new(value, now, ttl_ms);
        match key {
            CacheKey::Quote(_) => {
                if let Some(tier) = &self.durable {
                    tier.set(&storage_key, &entry);
                }
            }
            CacheKey::Series { ticker, interval } => {
                if let Some(tier) = &self.series {
                    tier.set(ticker, interval, &entry);
                }
            }
        }

        let memory_ttl = ttl_ms.min(millis(self.memory_ttl));
        self.memory
            .insert(storage_key, CacheEntry::new(entry.data, now, memory_ttl));
    }

    /// Drop `key` from every tier.
    pub fn remove(&self, key: &CacheKey) {
        let storage_key = key.storage_key();
        self.memory.remove(&storage_key);
        match key {
            CacheKey::Quote(_) => {
                if let Some(tier) = &self.durable {
                    tier.remove(&storage_key);
                }
            }
            CacheKey::Series { .. } => {
                if let Some(tier) = &self.series {
                    tier.remove(&storage_key);
                }
            }
        }
    }

    /// Drop every cached value.
    pub fn clear(&self) {
        self.memory.clear();
        if let Some(tier) = &self.durable {
            tier.clear();
        }
        if let Some(tier) = &self.series {
            tier.clear();
        }
    }

    /// Purge expired entries from every tier, returning how many.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let memory = self.memory.sweep(now);
        let durable = self.durable.as_ref().map_or(0, |t| t.sweep(now));
        let series = self.series.as_ref().map_or(0, |t| t.sweep(now));
        let removed = memory + durable + series;
        if removed > 0 {
            debug!(memory, durable, series, "cache sweep");
        }
        removed
    }

    /// Live series for every interval of `ticker`.
    pub fn series_for_ticker(&self, ticker: &str) -> Vec<T> {
        let now = self.clock.now_millis();
        self.series.as_ref().map_or_else(Vec::new, |tier| {
            tier.for_ticker::<T>(ticker, now)
                .into_iter()
                .map(|e| e.data)
                .collect()
        })
    }

    /// Run [`TieredCache::sweep`] every `period` on the tokio runtime.
    ///
    /// The task holds a weak reference and stops once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        let period = period.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                cache.sweep();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryKvStore, MemorySeriesStore};
    use crate::RedbStore;
    use chrono::{TimeZone, Utc};
    use pulse_traits::ManualClock;
    use tempfile::TempDir;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.timestamp_millis_opt(1_000).unwrap()))
    }

    fn secs(s: i64) -> chrono::Duration {
        chrono::Duration::seconds(s)
    }

    #[test]
    fn test_get_after_set_within_ttl() {
        let clock = clock();
        let cache: TieredCache<String> = TieredCache::new(clock.clone());
        let key = CacheKey::quote("fear_greed");

        cache.set(&key, "42".into(), Duration::from_secs(30));
        assert_eq!(cache.get(&key).as_deref(), Some("42"));

        clock.advance(secs(31));
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn test_durable_hit_promoted_with_remaining_ttl() {
        let clock = clock();
        let store = Arc::new(MemoryKvStore::new());
        let cache: TieredCache<u32> = TieredCache::new(clock.clone())
            .with_durable(store)
            .with_memory_ttl(Duration::from_secs(10));
        let key = CacheKey::quote("hy_spread");

        cache.set(&key, 7, Duration::from_secs(100));
        // memory copy expires, durable copy survives
        clock.advance(secs(60));
        assert_eq!(cache.get(&key), Some(7));

        // promoted copy lives exactly as long as the durable entry
        clock.advance(secs(40));
        assert_eq!(cache.get(&key), Some(7));
        clock.advance(secs(1));
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn test_durable_survives_restart() {
        let clock = clock();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.redb");
        let key = CacheKey::quote("vix_level");
        {
            let store = Arc::new(RedbStore::open(&path).unwrap());
            let cache: TieredCache<f64> = TieredCache::new(clock.clone()).with_durable(store);
            cache.set(&key, 14.5, Duration::from_secs(300));
        }
        let store = Arc::new(RedbStore::open(&path).unwrap());
        let cache: TieredCache<f64> = TieredCache::new(clock).with_durable(store);
        assert_eq!(cache.get(&key), Some(14.5));
    }

    #[test]
    fn test_quota_evicts_oldest() {
        let clock = clock();
        // room for two entries but not three
        let store = Arc::new(MemoryKvStore::with_capacity(120));
        let cache: TieredCache<String> =
            TieredCache::new(clock.clone()).with_durable(store.clone());
        let ttl = Duration::from_secs(60);

        cache.set(&CacheKey::quote("k1"), "v1".into(), ttl);
        clock.advance(chrono::Duration::milliseconds(1_000));
        cache.set(&CacheKey::quote("k2"), "v2".into(), ttl);
        clock.advance(chrono::Duration::milliseconds(1_000));
        cache.set(&CacheKey::quote("k3"), "v3".into(), ttl);

        assert!(store.get("cache:k1").unwrap().is_none());
        assert!(store.get("cache:k2").unwrap().is_some());
        assert!(store.get("cache:k3").unwrap().is_some());
    }

    #[test]
    fn test_oversized_entry_degrades_to_memory_only() {
        let clock = clock();
        let store = Arc::new(MemoryKvStore::with_capacity(8));
        let cache: TieredCache<String> = TieredCache::new(clock).with_durable(store.clone());
        let key = CacheKey::quote("big");

        cache.set(&key, "x".repeat(64), Duration::from_secs(60));
        assert_eq!(store.used_bytes(), 0);
        assert_eq!(cache.get(&key).map(|s| s.len()), Some(64));
    }

    #[test]
    fn test_series_routing_and_ticker_query() {
        let clock = clock();
        let kv = Arc::new(MemoryKvStore::new());
        let cache: TieredCache<Vec<f64>> = TieredCache::new(clock)
            .with_durable(kv.clone())
            .with_series(Arc::new(MemorySeriesStore::new()));

        let ttl = Duration::from_secs(600);
        cache.set(&CacheKey::series("spy", "1d"), vec![1.0, 2.0], ttl);
        cache.set(&CacheKey::series("spy", "1wk"), vec![3.0], ttl);
        cache.set(&CacheKey::series("hyg", "1d"), vec![4.0], ttl);

        // series never land in the key-value tier
        assert!(kv.keys().unwrap().is_empty());
        assert_eq!(cache.series_for_ticker("SPY").len(), 2);
        assert_eq!(
            cache.get(&CacheKey::series("SPY", "1d")),
            Some(vec![1.0, 2.0])
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let clock = clock();
        let kv = Arc::new(MemoryKvStore::new());
        let cache: TieredCache<u32> = TieredCache::new(clock).with_durable(kv.clone());
        let a = CacheKey::quote("a");
        let b = CacheKey::quote("b");
        cache.set(&a, 1, Duration::from_secs(60));
        cache.set(&b, 2, Duration::from_secs(60));

        cache.remove(&a);
        assert_eq!(cache.get(&a), None);
        assert_eq!(cache.get(&b), Some(2));

        cache.clear();
        assert_eq!(cache.get(&b), None);
        assert!(kv.keys().unwrap().is_empty());
    }

    #[test]
    fn test_sweep_counts_every_tier() {
        let clock = clock();
        let cache: TieredCache<u32> = TieredCache::new(clock.clone())
            .with_durable(Arc::new(MemoryKvStore::new()))
            .with_series(Arc::new(MemorySeriesStore::new()));

        cache.set(&CacheKey::quote("q"), 1, Duration::from_secs(5));
        cache.set(&CacheKey::series("spy", "1d"), 2, Duration::from_secs(5));
        clock.advance(secs(6));

        // two memory copies, one quote, one series
        assert_eq!(cache.sweep(), 4);
        assert_eq!(cache.sweep(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_sweeper_purges_memory() {
        let clock = clock();
        let cache: Arc<TieredCache<u32>> = Arc::new(TieredCache::new(clock.clone()));
        cache.set(&CacheKey::quote("q"), 1, Duration::from_secs(1));
        clock.advance(secs(2));

        let handle = cache.spawn_sweeper(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(cache.memory.is_empty());

        drop(cache);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(handle.is_finished());
    }
}
