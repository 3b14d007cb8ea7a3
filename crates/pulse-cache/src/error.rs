//! Error types for storage substrates.
//!
//! These errors never leave the cache: every tier converts them into a miss
//! and a `tracing` warning. They are public so that other durable consumers
//! (the score history) can apply their own degradation policy.

use pulse_traits::{ErrorKind, PulseError};
use thiserror::Error;

/// Errors raised by a [`crate::KvStore`] or [`crate::SeriesStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write would exceed the store's capacity.
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    Quota {
        /// Bytes the write needs.
        needed: usize,
        /// Bytes left in the store.
        available: usize,
    },

    /// The store is disabled or cannot be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded.
    #[error("Corrupt entry {key}: {reason}")]
    Corrupt {
        /// Key of the offending record.
        key: String,
        /// Decoder message.
        reason: String,
    },

    /// The embedded database failed.
    #[error("Database error: {0}")]
    Backend(#[from] redb::Error),

    /// A value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Wrap any redb error.
    pub fn backend(e: impl Into<redb::Error>) -> Self {
        Self::Backend(e.into())
    }

    /// Whether this is a capacity failure that eviction could fix.
    #[must_use]
    pub const fn is_quota(&self) -> bool {
        matches!(self, Self::Quota { .. })
    }

    /// Coarse classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Serialization(_) => ErrorKind::DataFormat,
            _ => ErrorKind::Storage,
        }
    }
}

impl From<StorageError> for PulseError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
