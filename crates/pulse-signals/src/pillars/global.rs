//! Global pillar: dollar, international equities and copper/gold.

use pulse_traits::SignalKey;

use crate::rule::{ScoreRule, StepSignal, Unit};

/// Dollar index 20-day change; a falling dollar eases global conditions.
#[must_use]
pub fn dollar_change_20d() -> StepSignal {
    StepSignal::new(
        SignalKey::DollarChange20d,
        "Dollar index 20-day change",
        "DXY",
        Unit::Percent,
        ScoreRule::AtMost {
            bands: &[(-2.0, 85), (0.0, 70), (2.0, 45), (4.0, 25)],
            otherwise: 10,
        },
    )
}

/// World ex-US equities percent distance from the 200-day average.
#[must_use]
pub fn world_ex_us_vs_200dma() -> StepSignal {
    StepSignal::new(
        SignalKey::WorldExUsVs200Dma,
        "World ex-US vs 200-day MA",
        "ACWX",
        Unit::Percent,
        ScoreRule::AtLeast {
            bands: &[(5.0, 90), (0.0, 65), (-5.0, 35)],
            otherwise: 10,
        },
    )
}

/// Copper/gold ratio 20-day change.
#[must_use]
pub fn copper_gold_change_20d() -> StepSignal {
    StepSignal::new(
        SignalKey::CopperGoldChange20d,
        "Copper/gold 20-day change",
        "HG/GC",
        Unit::Percent,
        ScoreRule::AtLeast {
            bands: &[(3.0, 85), (0.0, 65), (-3.0, 40)],
            otherwise: 15,
        },
    )
}

/// All global signals.
#[must_use]
pub fn signals() -> [StepSignal; 3] {
    [
        dollar_change_20d(),
        world_ex_us_vs_200dma(),
        copper_gold_change_20d(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_traits::{RawValue, Signal};

    #[test]
    fn test_dollar_bands() {
        let signal = dollar_change_20d();
        assert_eq!(signal.score(&RawValue::Number(-3.0)).unwrap(), 85);
        assert_eq!(signal.score(&RawValue::Number(0.0)).unwrap(), 70);
        assert_eq!(signal.score(&RawValue::Number(5.0)).unwrap(), 10);
    }

    #[test]
    fn test_world_and_copper_bands() {
        assert_eq!(world_ex_us_vs_200dma().score(&RawValue::Number(1.0)).unwrap(), 65);
        assert_eq!(copper_gold_change_20d().score(&RawValue::Number(-4.0)).unwrap(), 15);
    }
}
