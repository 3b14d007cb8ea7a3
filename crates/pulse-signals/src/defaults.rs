//! Neutral fallback values for signals that could not be fetched.
//!
//! This is the single table consulted by the missing-signal substitution
//! path. Each value sits in a middle band of its signal so a missing reading
//! pulls its pillar toward neutral instead of dropping it.

use pulse_traits::{RawValue, SignalKey};

/// Number of missing signals above which a report is flagged incomplete.
pub const MISSING_SIGNAL_THRESHOLD: usize = 6;

/// Fallback raw value for a signal.
#[must_use]
pub const fn fallback_value(key: SignalKey) -> RawValue {
    use RawValue::{Flag, Number};
    match key {
        SignalKey::SpxVs200Dma => Number(0.0),
        SignalKey::SpxMomentum20d => Number(0.0),
        SignalKey::GoldenCross => Flag(true),
        SignalKey::PctAbove200Dma => Number(50.0),
        SignalKey::AdvanceDeclineRatio => Number(1.0),
        SignalKey::HighsLowsRatio => Number(1.0),
        SignalKey::VixLevel => Number(20.0),
        SignalKey::VixTermRatio => Number(0.95),
        SignalKey::VixContango => Flag(true),
        SignalKey::HySpread => Number(4.0),
        SignalKey::IgSpread => Number(1.4),
        SignalKey::YieldCurvePositive => Flag(true),
        SignalKey::FearGreed => Number(50.0),
        SignalKey::PutCallRatio => Number(0.9),
        SignalKey::AaiiSpread => Number(5.0),
        SignalKey::DollarChange20d => Number(0.0),
        SignalKey::WorldExUsVs200Dma => Number(0.0),
        SignalKey::CopperGoldChange20d => Number(0.0),
    }
}
