#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pulse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # pulse
//!
//! Composite market health score from six pillars of market signals.
//!
//! pulse is an umbrella crate that wires the Pulse sub-crates together behind
//! [`MarketPulse`] and re-exports them for convenience.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use pulse::{MarketPulse, PulseConfig};
//! use pulse::fetch::HttpSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PulseConfig::from_env()?;
//!     let source = HttpSource::from_env("http", "https://signals.example.com")?;
//!
//!     let pulse = MarketPulse::builder()
//!         .config(config)
//!         .source(Arc::new(source))
//!         .build()?;
//!
//!     let outcome = pulse.refresh().await?;
//!     println!("{} ({})", outcome.report.score, outcome.report.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Signal and pillar identifiers, raw values, errors, clocks
//! - [`signals`] - The 18 scoring rules and the fallback table
//! - [`combine`] - Pillar aggregation, composite weighting, status bands
//! - [`fetch`] - Source contract, HTTP source, rate limiting and retries
//! - [`cache`] - Volatile, key-value and time-series cache tiers
//! - [`history`] - Rolling daily score log and percentile rank
//!
//! ## Architecture
//!
//! 1. **Sources** fetch raw signal values, gated by a per-provider rate
//!    limiter, retries and the tiered cache
//! 2. **Signals** map each raw value to a 0-100 score
//! 3. **Pillars** average three signal scores each
//! 4. **The combiner** weights six pillars into the composite
//! 5. **History** ranks the composite against the last 30 days

/// Version information for the pulse crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;
mod monitor;

pub use config::{ENV_PREFIX, PulseConfig, default_data_dir};
pub use monitor::{
    Collection, Cycle, DB_FILE, FetchFailure, HISTORY_TABLE, MarketPulse, MarketPulseBuilder, RefreshOutcome,
};

// Re-export error types and common types
pub use pulse_combine::{CompositeReport, HealthStatus, LiteIndex, LiteQuotes};
pub use pulse_traits::{PillarKey, PulseError, Result, Score, SignalKey, Snapshot};

/// Core types and traits.
pub mod traits {
    pub use pulse_traits::*;
}

/// Signal definitions.
pub mod signals {
    pub use pulse_signals::*;
}

/// Pillar and composite scoring.
pub mod combine {
    pub use pulse_combine::*;
}

/// Data sources.
///
/// Set `PULSE_API_KEY` in the environment or a `.env` file before calling
/// [`fetch::HttpSource::from_env`].
pub mod fetch {
    pub use pulse_fetch::*;
}

/// Cache tiers and storage substrates.
pub mod cache {
    pub use pulse_cache::*;
}

/// Score history.
pub mod history {
    pub use pulse_history::*;
}

/// Prelude module for convenient imports.
///
/// ```ignore
/// use pulse::prelude::*;
/// ```
pub mod prelude {
    pub use crate::fetch::{SignalSource, StaticSource};
    pub use crate::{
        CompositeReport, HealthStatus, MarketPulse, PulseConfig, PulseError, Result, SignalKey,
        Snapshot,
    };
}
