//! Breadth pillar.
//!
//! Market-wide participation counts are not fetched directly. Each value is
//! estimated from the equal-weight index proxy (RSP) by the data source, and
//! the bands below score that estimate as given.

use pulse_traits::SignalKey;

use crate::rule::{ScoreRule, StepSignal, Unit};

/// Estimated percent of index members above their 200-day average.
#[must_use]
pub fn pct_above_200dma() -> StepSignal {
    StepSignal::new(
        SignalKey::PctAbove200Dma,
        "% above 200-day MA",
        "RSP",
        Unit::Level,
        ScoreRule::AtLeast {
            bands: &[(70.0, 100), (60.0, 80), (50.0, 60), (40.0, 40), (30.0, 20)],
            otherwise: 0,
        },
    )
}

/// Advancing over declining issues.
#[must_use]
pub fn advance_decline_ratio() -> StepSignal {
    StepSignal::new(
        SignalKey::AdvanceDeclineRatio,
        "Advance/decline ratio",
        "RSP",
        Unit::Ratio,
        ScoreRule::AtLeast {
            bands: &[(2.0, 100), (1.5, 80), (1.0, 60), (0.75, 40), (0.5, 20)],
            otherwise: 0,
        },
    )
}

/// New highs over new lows.
#[must_use]
pub fn highs_lows_ratio() -> StepSignal {
    StepSignal::new(
        SignalKey::HighsLowsRatio,
        "New highs/lows ratio",
        "RSP",
        Unit::Ratio,
        ScoreRule::AtLeast {
            bands: &[(3.0, 90), (1.5, 70), (1.0, 55), (0.5, 35)],
            otherwise: 15,
        },
    )
}

/// All breadth signals.
#[must_use]
pub fn signals() -> [StepSignal; 3] {
    [pct_above_200dma(), advance_decline_ratio(), highs_lows_ratio()]
}
