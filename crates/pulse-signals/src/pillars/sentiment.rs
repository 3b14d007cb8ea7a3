//! Sentiment pillar.
//!
//! All three readings are scored contrarian: crowd fear scores high, crowd
//! euphoria scores low. None of them can reach 0 or 100; the achievable range
//! is `[10, 95]`.

use pulse_traits::SignalKey;

use crate::rule::{ScoreRule, StepSignal, Unit};

/// Fear & greed index, 0 (extreme fear) to 100 (extreme greed).
#[must_use]
pub fn fear_greed() -> StepSignal {
    StepSignal::new(
        SignalKey::FearGreed,
        "Fear & Greed index",
        "CNN-FG",
        Unit::Level,
        ScoreRule::AtMost {
            bands: &[(20.0, 95), (35.0, 75), (55.0, 55), (75.0, 35)],
            otherwise: 10,
        },
    )
}

/// Equity put/call ratio.
#[must_use]
pub fn put_call_ratio() -> StepSignal {
    StepSignal::new(
        SignalKey::PutCallRatio,
        "Equity put/call ratio",
        "CPCE",
        Unit::Ratio,
        ScoreRule::AtLeast {
            bands: &[(1.2, 95), (1.0, 75), (0.8, 55), (0.6, 35)],
            otherwise: 10,
        },
    )
}

/// AAII bulls minus bears, percentage points.
#[must_use]
pub fn aaii_spread() -> StepSignal {
    StepSignal::new(
        SignalKey::AaiiSpread,
        "AAII bull-bear spread",
        "AAII",
        Unit::Percent,
        ScoreRule::AtMost {
            bands: &[(-20.0, 95), (-5.0, 75), (10.0, 55), (25.0, 35)],
            otherwise: 10,
        },
    )
}

/// All sentiment signals.
#[must_use]
pub fn signals() -> [StepSignal; 3] {
    [fear_greed(), put_call_ratio(), aaii_spread()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_traits::{RawValue, Signal};

    #[test]
    fn test_contrarian_ranges() {
        for signal in signals() {
            assert_eq!(signal.score_range(), (10, 95), "{}", signal.name());
        }
    }

    #[test]
    fn test_fear_scores_high() {
        assert_eq!(fear_greed().score(&RawValue::Number(5.0)).unwrap(), 95);
        assert_eq!(fear_greed().score(&RawValue::Number(90.0)).unwrap(), 10);
        assert_eq!(put_call_ratio().score(&RawValue::Number(1.3)).unwrap(), 95);
        assert_eq!(aaii_spread().score(&RawValue::Number(-30.0)).unwrap(), 95);
    }
}
