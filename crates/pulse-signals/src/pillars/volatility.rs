//! Volatility pillar: implied volatility level and term structure.

use pulse_traits::SignalKey;

use crate::rule::{ScoreRule, StepSignal, Unit};

/// Spot volatility index level bands, shared with the lite index.
pub const VIX_LEVEL_RULE: ScoreRule = ScoreRule::AtMost {
    bands: &[
        (12.0, 100),
        (15.0, 85),
        (18.0, 70),
        (22.0, 50),
        (28.0, 30),
        (35.0, 15),
    ],
    otherwise: 0,
};

/// Spot volatility index.
#[must_use]
pub fn vix_level() -> StepSignal {
    StepSignal::new(
        SignalKey::VixLevel,
        "VIX level",
        "^VIX",
        Unit::Level,
        VIX_LEVEL_RULE,
    )
}

/// Spot over 3-month volatility index; above 1.0 means backwardation.
#[must_use]
pub fn vix_term_ratio() -> StepSignal {
    StepSignal::new(
        SignalKey::VixTermRatio,
        "VIX/VIX3M ratio",
        "^VIX3M",
        Unit::Ratio,
        ScoreRule::AtMost {
            bands: &[
                (0.85, 85),
                (0.90, 75),
                (0.95, 60),
                (1.00, 40),
                (1.10, 20),
            ],
            otherwise: 5,
        },
    )
}

/// Volatility futures curve in contango.
#[must_use]
pub fn vix_contango() -> StepSignal {
    StepSignal::new(
        SignalKey::VixContango,
        "VIX futures contango",
        "VX",
        Unit::Flag,
        ScoreRule::Flag { on: 70, off: 30 },
    )
}

/// All volatility signals.
#[must_use]
pub fn signals() -> [StepSignal; 3] {
    [vix_level(), vix_term_ratio(), vix_contango()]
}
