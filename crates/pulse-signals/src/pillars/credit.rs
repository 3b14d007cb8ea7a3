//! Credit pillar: corporate spreads and the Treasury curve.

use pulse_traits::SignalKey;

use crate::rule::{ScoreRule, StepSignal, Unit};

/// High-yield option-adjusted spread, percent.
#[must_use]
pub fn hy_spread() -> StepSignal {
    StepSignal::new(
        SignalKey::HySpread,
        "High-yield spread",
        "BAMLH0A0HYM2",
        Unit::Percent,
        ScoreRule::AtMost {
            bands: &[(3.0, 95), (3.5, 80), (4.5, 60), (5.5, 40), (7.0, 20)],
            otherwise: 5,
        },
    )
}

/// Investment-grade option-adjusted spread, percent.
#[must_use]
pub fn ig_spread() -> StepSignal {
    StepSignal::new(
        SignalKey::IgSpread,
        "Investment-grade spread",
        "BAMLC0A0CM",
        Unit::Percent,
        ScoreRule::AtMost {
            bands: &[(1.0, 90), (1.3, 75), (1.6, 55), (2.0, 35)],
            otherwise: 15,
        },
    )
}

/// 10-year minus 2-year Treasury spread above zero.
#[must_use]
pub fn yield_curve_positive() -> StepSignal {
    StepSignal::new(
        SignalKey::YieldCurvePositive,
        "Yield curve (10y-2y) positive",
        "T10Y2Y",
        Unit::Flag,
        ScoreRule::Flag { on: 65, off: 35 },
    )
}

/// All credit signals.
#[must_use]
pub fn signals() -> [StepSignal; 3] {
    [hy_spread(), ig_spread(), yield_curve_positive()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_traits::{RawValue, Signal};

    #[test]
    fn test_hy_spread_bands() {
        let signal = hy_spread();
        assert_eq!(signal.score(&RawValue::Number(2.8)).unwrap(), 95);
        assert_eq!(signal.score(&RawValue::Number(4.0)).unwrap(), 60);
        assert_eq!(signal.score(&RawValue::Number(9.0)).unwrap(), 5);
    }

    #[test]
    fn test_ig_spread_range() {
        assert_eq!(ig_spread().score_range(), (15, 90));
    }

    #[test]
    fn test_curve_flag() {
        let signal = yield_curve_positive();
        assert_eq!(signal.score(&RawValue::Flag(false)).unwrap(), 35);
    }
}
