//! Cache keys and resource kinds.

use std::fmt;

/// Storage prefix for quote entries in a shared key-value store.
pub(crate) const QUOTE_PREFIX: &str = "cache:";

/// Kind of cached resource, which decides the durable tier it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Small point-in-time value, stored in the key-value tier.
    Quote,
    /// Time-series payload, stored in the structured tier.
    Series,
}

/// Identifies one cached resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A quote keyed by name.
    Quote(String),
    /// A series keyed by ticker and sampling interval.
    Series {
        /// Upper-cased ticker.
        ticker: String,
        /// Interval label such as `1d`.
        interval: String,
    },
}

impl CacheKey {
    /// Key for a quote resource.
    pub fn quote(name: impl Into<String>) -> Self {
        Self::Quote(name.into())
    }

    /// Key for a series resource. Tickers are case-insensitive.
    pub fn series(ticker: &str, interval: impl Into<String>) -> Self {
        Self::Series {
            ticker: ticker.to_uppercase(),
            interval: interval.into(),
        }
    }

    /// Resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Quote(_) => ResourceKind::Quote,
            Self::Series { .. } => ResourceKind::Series,
        }
    }

    /// Key used in the backing stores.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Quote(name) => format!("{QUOTE_PREFIX}{name}"),
            Self::Series { ticker, interval } => series_key(ticker, interval),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// `TICKER|interval`, the primary key of the series table.
#[must_use]
pub fn series_key(ticker: &str, interval: &str) -> String {
    format!("{}|{interval}", ticker.to_uppercase())
}

/// Prefix shared by every series of one ticker.
pub(crate) fn ticker_prefix(ticker: &str) -> String {
    format!("{}|", ticker.to_uppercase())
}
