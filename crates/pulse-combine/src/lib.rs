//! Pillar aggregation and composite scoring for Pulse.
//!
//! This crate turns a [`pulse_traits::Snapshot`] of raw values into a
//! [`CompositeReport`]: each signal is scored, signals are averaged into six
//! pillars, and the pillars are combined with fixed weights into one score.
//! It also provides the status bands, the pillar agreement summary and the
//! three-component lite index.
//!
//! # Examples
//!
//! ```rust
//! use pulse_combine::{PillarWeights, ScoringEngine};
//! use pulse_traits::{RawSignalValue, SignalKey, Snapshot};
//!
//! let engine = ScoringEngine::new(PillarWeights::default()).unwrap();
//! let snapshot: Snapshot = [
//!     RawSignalValue::new(SignalKey::VixLevel, 14.0),
//!     RawSignalValue::new(SignalKey::VixTermRatio, 0.95),
//!     RawSignalValue::new(SignalKey::VixContango, true),
//! ]
//! .into_iter()
//! .collect();
//!
//! let report = engine.evaluate(&snapshot).unwrap();
//! assert_eq!(report.pillar_scores()[&pulse_traits::PillarKey::Volatility], 72);
//! assert_eq!(report.missing.len(), 15);
//! ```

mod agreement;
mod combiner;
mod engine;
mod lite;
mod pillar;
mod status;

// Re-export main types
pub use agreement::{Agreement, AgreementSummary, BEARISH_CEILING, BULLISH_FLOOR};
pub use combiner::{Combiner, PillarScore, PillarWeights, WeightedCombiner};
pub use engine::{CompositeReport, ScoringEngine};
pub use lite::{LiteIndex, LiteQuotes};
pub use pillar::Pillar;
pub use status::HealthStatus;
