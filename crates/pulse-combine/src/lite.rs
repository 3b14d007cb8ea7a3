//! Lightweight three-component market index.
//!
//! A cheaper companion to the composite that needs only four instruments:
//! SPY for direction, HYG and LQD for risk appetite, VIX for volatility.
//! When any of them is unavailable the index reports the neutral default
//! rather than an error.

use pulse_signals::pillars::volatility::VIX_LEVEL_RULE;
use pulse_traits::{RawValue, Score, stats::rounded_ratio};
use serde::{Deserialize, Serialize};

const NEUTRAL: Score = 50;

/// Component weights in tenths: direction, risk appetite, volatility.
const WEIGHTS: [u64; 3] = [4, 3, 3];

/// Inputs for the lite index, each a 20-day return in percent except `vix`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiteQuotes {
    /// SPY 20-day return.
    pub spy_return_pct: Option<f64>,
    /// HYG 20-day return.
    pub hyg_return_pct: Option<f64>,
    /// LQD 20-day return.
    pub lqd_return_pct: Option<f64>,
    /// Spot VIX level.
    pub vix: Option<f64>,
}

/// Lite index result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiteIndex {
    /// Weighted score.
    pub score: Score,
    /// Market direction component.
    pub direction: Score,
    /// Risk appetite component.
    pub risk_appetite: Score,
    /// Volatility component.
    pub volatility: Score,
    /// Whether the neutral default was used.
    pub degraded: bool,
}

impl LiteIndex {
    /// The neutral default used when inputs are missing.
    pub const NEUTRAL: Self = Self {
        score: NEUTRAL,
        direction: NEUTRAL,
        risk_appetite: NEUTRAL,
        volatility: NEUTRAL,
        degraded: true,
    };

    /// Compute the index, falling back to [`LiteIndex::NEUTRAL`] when any
    /// instrument is absent or not finite.
    #[must_use]
    pub fn compute(quotes: &LiteQuotes) -> Self {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        let (Some(spy), Some(hyg), Some(lqd), Some(vix)) = (
            finite(quotes.spy_return_pct),
            finite(quotes.hyg_return_pct),
            finite(quotes.lqd_return_pct),
            finite(quotes.vix),
        ) else {
            return Self::NEUTRAL;
        };

        let direction = linear(spy, 10.0);
        let risk_appetite = linear(hyg - lqd, 20.0);
        let volatility = VIX_LEVEL_RULE
            .apply(&RawValue::Number(vix))
            .unwrap_or(NEUTRAL);

        let weighted: u64 = [direction, risk_appetite, volatility]
            .iter()
            .zip(WEIGHTS)
            .map(|(&c, w)| u64::from(c) * w)
            .sum();
        let score = rounded_ratio(weighted, 10).unwrap_or(u64::from(NEUTRAL)) as Score;

        Self {
            score,
            direction,
            risk_appetite,
            volatility,
            degraded: false,
        }
    }
}

/// `50 + slope × x`, rounded and clamped to `[0, 100]`.
fn linear(x: f64, slope: f64) -> Score {
    (50.0 + slope * x).round().clamp(0.0, 100.0) as Score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes() -> LiteQuotes {
        LiteQuotes {
            spy_return_pct: Some(2.0),
            hyg_return_pct: Some(1.0),
            lqd_return_pct: Some(0.5),
            vix: Some(14.0),
        }
    }

    #[test]
    fn test_full_inputs() {
        let index = LiteIndex::compute(&quotes());
        assert_eq!(index.direction, 70);
        assert_eq!(index.risk_appetite, 60);
        assert_eq!(index.volatility, 85);
        // 0.4 * 70 + 0.3 * 60 + 0.3 * 85 = 71.5
        assert_eq!(index.score, 72);
        assert!(!index.degraded);
    }

    #[test]
    fn test_any_missing_instrument_degrades_to_neutral() {
        for i in 0..4 {
            let mut q = quotes();
            match i {
                0 => q.spy_return_pct = None,
                1 => q.hyg_return_pct = None,
                2 => q.lqd_return_pct = None,
                _ => q.vix = None,
            }
            assert_eq!(LiteIndex::compute(&q), LiteIndex::NEUTRAL);
        }
    }

    #[test]
    fn test_non_finite_degrades() {
        let mut q = quotes();
        q.vix = Some(f64::NAN);
        assert!(LiteIndex::compute(&q).degraded);
    }

    #[test]
    fn test_components_clamped() {
        let q = LiteQuotes {
            spy_return_pct: Some(40.0),
            hyg_return_pct: Some(-10.0),
            lqd_return_pct: Some(10.0),
            vix: Some(80.0),
        };
        let index = LiteIndex::compute(&q);
        assert_eq!(index.direction, 100);
        assert_eq!(index.risk_appetite, 0);
        assert_eq!(index.volatility, 0);
        assert_eq!(index.score, 40);
    }
}
