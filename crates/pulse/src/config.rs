//! Runtime configuration.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use pulse_fetch::RetryPolicy;
use pulse_signals::MISSING_SIGNAL_THRESHOLD;
use pulse_traits::{PulseError, Result};
use serde::{Deserialize, Serialize};

/// Prefix shared by every environment variable read by [`PulseConfig::from_env`].
pub const ENV_PREFIX: &str = "PULSE_";

/// Per-user data directory, `pulse` under the platform data dir
/// (`~/.local/share/pulse` on Linux). `None` if the platform has none.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("pulse"))
}

/// Settings for a [`crate::MarketPulse`] instance.
///
/// Every field has a default, so a partial JSON document or an empty
/// environment yields a working configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Longest time a value stays in the in-process tier.
    pub memory_ttl: Duration,
    /// TTL of fetched signal values in the durable tier.
    pub durable_ttl: Duration,
    /// TTL of time-series records.
    pub series_ttl: Duration,
    /// Byte budget of the key-value cache tier. Oldest entries are evicted
    /// past it. The score history is not counted.
    pub kv_capacity_bytes: usize,
    /// Directory for the redb database, [`default_data_dir`] by default.
    /// In-memory stores are used when unset, and nothing outlives the process.
    pub data_dir: Option<PathBuf>,
    /// Base URL of the HTTP signal endpoint, if any.
    pub base_url: Option<String>,
    /// Calls per minute for providers without an entry in `budgets`.
    pub default_budget: usize,
    /// Calls per minute by provider name.
    pub budgets: BTreeMap<String, usize>,
    /// Attempts per fetch, including the first.
    pub retry_attempts: u32,
    /// Backoff before the first retry.
    pub retry_base_delay: Duration,
    /// Fallback readings tolerated before a report is flagged incomplete.
    pub missing_threshold: usize,
    /// How often expired cache entries are swept.
    pub sweep_interval: Duration,
}

impl Default for PulseConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            memory_ttl: Duration::from_secs(60),
            durable_ttl: Duration::from_secs(15 * 60),
            series_ttl: Duration::from_secs(24 * 60 * 60),
            kv_capacity_bytes: 5 * 1024 * 1024,
            data_dir: default_data_dir(),
            base_url: None,
            default_budget: 30,
            budgets: BTreeMap::new(),
            retry_attempts: retry.max_attempts,
            retry_base_delay: retry.base_delay,
            missing_threshold: MISSING_SIGNAL_THRESHOLD,
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl PulseConfig {
    /// Defaults without a data directory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            ..Self::default()
        }
    }

    /// Load `.env` if present, then read `PULSE_*` variables over the
    /// defaults.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `PULSE_MEMORY_TTL_SECS` | `memory_ttl` |
    /// | `PULSE_DURABLE_TTL_SECS` | `durable_ttl` |
    /// | `PULSE_SERIES_TTL_SECS` | `series_ttl` |
    /// | `PULSE_KV_CAPACITY_BYTES` | `kv_capacity_bytes` |
    /// | `PULSE_DATA_DIR` | `data_dir` |
    /// | `PULSE_BASE_URL` | `base_url` |
    /// | `PULSE_DEFAULT_BUDGET` | `default_budget` |
    /// | `PULSE_BUDGETS` | `budgets`, as `name=calls,name=calls` |
    /// | `PULSE_RETRY_ATTEMPTS` | `retry_attempts` |
    /// | `PULSE_RETRY_BASE_MS` | `retry_base_delay` |
    /// | `PULSE_MISSING_THRESHOLD` | `missing_threshold` |
    /// | `PULSE_SWEEP_SECS` | `sweep_interval` |
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::InvalidConfig`] if a variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self> {
        // a missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup. `lookup`
    /// receives full variable names, prefix included.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::InvalidConfig`] on unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |suffix: &str| {
            let name = format!("{ENV_PREFIX}{suffix}");
            lookup(&name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (name, v))
        };

        let mut config = Self::default();
        if let Some((name, v)) = var("MEMORY_TTL_SECS") {
            config.memory_ttl = Duration::from_secs(parse(&name, &v)?);
        }
        if let Some((name, v)) = var("DURABLE_TTL_SECS") {
            config.durable_ttl = Duration::from_secs(parse(&name, &v)?);
        }
        if let Some((name, v)) = var("SERIES_TTL_SECS") {
            config.series_ttl = Duration::from_secs(parse(&name, &v)?);
        }
        if let Some((name, v)) = var("KV_CAPACITY_BYTES") {
            config.kv_capacity_bytes = parse(&name, &v)?;
        }
        if let Some((_, v)) = var("DATA_DIR") {
            config.data_dir = Some(PathBuf::from(v));
        }
        if let Some((_, v)) = var("BASE_URL") {
            config.base_url = Some(v);
        }
        if let Some((name, v)) = var("DEFAULT_BUDGET") {
            config.default_budget = parse(&name, &v)?;
        }
        if let Some((name, v)) = var("BUDGETS") {
            config.budgets = parse_budgets(&name, &v)?;
        }
        if let Some((name, v)) = var("RETRY_ATTEMPTS") {
            config.retry_attempts = parse(&name, &v)?;
        }
        if let Some((name, v)) = var("RETRY_BASE_MS") {
            config.retry_base_delay = Duration::from_millis(parse(&name, &v)?);
        }
        if let Some((name, v)) = var("MISSING_THRESHOLD") {
            config.missing_threshold = parse(&name, &v)?;
        }
        if let Some((name, v)) = var("SWEEP_SECS") {
            config.sweep_interval = Duration::from_secs(parse(&name, &v)?);
        }
        Ok(config)
    }

    /// Calls per minute allowed for `provider`.
    #[must_use]
    pub fn budget(&self, provider: &str) -> usize {
        self.budgets
            .get(provider)
            .copied()
            .unwrap_or(self.default_budget)
    }

    /// Retry policy built from the retry fields.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            base_delay: self.retry_base_delay,
        }
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| PulseError::InvalidConfig(format!("{name}: cannot parse {value:?}")))
}

fn parse_budgets(name: &str, value: &str) -> Result<BTreeMap<String, usize>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (provider, calls) = pair.split_once('=').ok_or_else(|| {
                PulseError::InvalidConfig(format!("{name}: expected provider=calls, got {pair:?}"))
            })?;
            Ok((provider.trim().to_string(), parse(name, calls.trim())?))
        })
        .collect()
}
