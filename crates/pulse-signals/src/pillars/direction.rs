//! Direction pillar: trend and momentum of the S&P 500.

use pulse_traits::SignalKey;

use crate::rule::{ScoreRule, StepSignal, Unit};

/// Percent distance of the S&P 500 from its 200-day moving average.
#[must_use]
pub fn spx_vs_200dma() -> StepSignal {
    StepSignal::new(
        SignalKey::SpxVs200Dma,
        "S&P 500 vs 200-day MA",
        "SPY",
        Unit::Percent,
        ScoreRule::AtLeast {
            bands: &[
                (5.0, 90),
                (2.0, 75),
                (0.0, 60),
                (-2.0, 45),
                (-5.0, 30),
                (-10.0, 15),
            ],
            otherwise: 5,
        },
    )
}

/// S&P 500 20-day return.
#[must_use]
pub fn spx_momentum_20d() -> StepSignal {
    StepSignal::new(
        SignalKey::SpxMomentum20d,
        "S&P 500 20-day momentum",
        "SPY",
        Unit::Percent,
        ScoreRule::AtLeast {
            bands: &[(5.0, 100), (2.0, 80), (0.0, 60), (-2.0, 40), (-5.0, 20)],
            otherwise: 0,
        },
    )
}

/// 50-day moving average above the 200-day.
#[must_use]
pub fn golden_cross() -> StepSignal {
    StepSignal::new(
        SignalKey::GoldenCross,
        "Golden cross",
        "SPY",
        Unit::Flag,
        ScoreRule::Flag { on: 75, off: 25 },
    )
}

/// All direction signals.
#[must_use]
pub fn signals() -> [StepSignal; 3] {
    [spx_vs_200dma(), spx_momentum_20d(), golden_cross()]
}
