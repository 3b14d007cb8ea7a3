//! Tiered caching for the Pulse market health engine.
//!
//! Provider calls are expensive and rate limited, so every fetched value is
//! cached in up to three tiers:
//!
//! 1. a process-local volatile map ([`MemoryTier`])
//! 2. a durable key-value store with a byte budget ([`DurableTier`] over a
//!    [`KvStore`]) for point-in-time quotes
//! 3. a durable structured store ([`SeriesTier`] over a [`SeriesStore`]) for
//!    time series, indexed by ticker and by expiry
//!
//! [`TieredCache`] is the front end. Storage failures never escape it; they
//! degrade to cache misses and are logged with `tracing`.
//!
//! # Stores
//!
//! [`RedbStore`] implements both store traits on a single redb file.
//! [`MemoryKvStore`] and [`MemorySeriesStore`] are in-process equivalents for
//! runs without a data directory.

mod entry;
mod error;
mod key;
mod redb_store;
mod store;
mod tier;
mod tiered;

pub use entry::CacheEntry;
pub use error::{Result, StorageError};
pub use key::{CacheKey, ResourceKind, series_key};
pub use redb_store::RedbStore;
pub use store::{KvStore, MemoryKvStore, MemorySeriesStore, SeriesRecord, SeriesStore};
pub use tier::{DurableTier, MemoryTier, SeriesTier};
pub use tiered::{DEFAULT_MEMORY_TTL, TieredCache};
