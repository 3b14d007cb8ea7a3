//! Signal implementations for the Pulse market health engine.
//!
//! This crate provides the 18 concrete signals, organised by pillar:
//! - Direction: trend, momentum and moving-average regime of the S&P 500
//! - Breadth: participation estimates from an equal-weight proxy
//! - Volatility: implied volatility level and term structure
//! - Credit: corporate spreads and the Treasury curve
//! - Sentiment: contrarian positioning and survey readings
//! - Global: dollar, international equities and copper/gold
//!
//! Each signal maps a raw value to an integer score with an ordered step
//! function. Missing or invalid values are replaced from one central
//! fallback table.
//!
//! # Example
//!
//! ```
//! use pulse_signals::registry::SignalRegistry;
//! use pulse_traits::{RawValue, Signal, SignalKey};
//!
//! let registry = SignalRegistry::standard();
//! let vix = registry.get(SignalKey::VixLevel).unwrap();
//! assert_eq!(vix.score(&RawValue::Number(14.0)).unwrap(), 85);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod defaults;
pub mod pillars;
pub mod reading;
pub mod registry;
pub mod rule;

// Re-export key types
pub use defaults::{MISSING_SIGNAL_THRESHOLD, fallback_value};
pub use reading::{SignalReading, read};
pub use registry::{SignalInfo, SignalRegistry, available_signals, signals_by_pillar};
pub use rule::{ScoreRule, StepSignal, Unit};
