//! Ordered step functions and the signal type built on them.

use pulse_traits::{PulseError, RawValue, Result, Score, Signal, SignalKey};
use serde::Serialize;

/// How a signal's raw value is rendered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    /// Percent or percentage points.
    Percent,
    /// Dimensionless ratio.
    Ratio,
    /// Index level.
    Level,
    /// Boolean regime flag.
    Flag,
}

impl Unit {
    /// Render a raw value in this unit.
    #[must_use]
    pub fn format(&self, value: &RawValue) -> String {
        match (self, value) {
            (_, RawValue::Flag(_)) => value.display(),
            (Self::Percent, RawValue::Number(v)) => format!("{v:+.2}%"),
            (Self::Ratio, RawValue::Number(v)) => format!("{v:.2}"),
            (Self::Level | Self::Flag, RawValue::Number(v)) => format!("{v:.1}"),
        }
    }
}

/// Mapping from a raw value to a score.
///
/// Numeric rules are ordered band tables evaluated top-down; the first band
/// that matches wins and `otherwise` catches everything past the last band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreRule {
    /// `value <= bound` selects the band (inclusive upper bound).
    AtMost {
        /// `(upper bound, score)` pairs in ascending bound order.
        bands: &'static [(f64, Score)],
        /// Score above the last bound.
        otherwise: Score,
    },
    /// `value >= bound` selects the band (inclusive lower bound).
    AtLeast {
        /// `(lower bound, score)` pairs in descending bound order.
        bands: &'static [(f64, Score)],
        /// Score below the last bound.
        otherwise: Score,
    },
    /// Two-value table for regime flags.
    Flag {
        /// Score when the flag is set.
        on: Score,
        /// Score when the flag is clear.
        off: Score,
    },
}

impl ScoreRule {
    /// Score a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::InvalidData`] if a numeric rule receives a flag
    /// (or the reverse) or the number is not finite.
    pub fn apply(&self, value: &RawValue) -> Result<Score> {
        match (self, value) {
            (Self::Flag { on, off }, RawValue::Flag(flag)) => Ok(if *flag { *on } else { *off }),
            (Self::Flag { .. }, RawValue::Number(v)) => Err(PulseError::InvalidData(format!(
                "expected a flag, got {v}"
            ))),
            (_, RawValue::Flag(flag)) => Err(PulseError::InvalidData(format!(
                "expected a number, got {flag}"
            ))),
            (_, RawValue::Number(v)) if !v.is_finite() => {
                Err(PulseError::InvalidData(format!("non-finite value {v}")))
            }
            (Self::AtMost { bands, otherwise }, RawValue::Number(v)) => Ok(bands
                .iter()
                .find(|(bound, _)| *v <= *bound)
                .map_or(*otherwise, |&(_, score)| score)),
            (Self::AtLeast { bands, otherwise }, RawValue::Number(v)) => Ok(bands
                .iter()
                .find(|(bound, _)| *v >= *bound)
                .map_or(*otherwise, |&(_, score)| score)),
        }
    }

    /// Closed range of achievable scores.
    #[must_use]
    pub fn range(&self) -> (Score, Score) {
        match self {
            Self::Flag { on, off } => ((*on).min(*off), (*on).max(*off)),
            Self::AtMost { bands, otherwise } | Self::AtLeast { bands, otherwise } => bands
                .iter()
                .map(|&(_, score)| score)
                .fold((*otherwise, *otherwise), |(lo, hi), s| (lo.min(s), hi.max(s))),
        }
    }

    /// Human-readable band description, e.g. `≤12 → 100, ≤15 → 85, >15 → 0`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Flag { on, off } => format!("yes → {on}, no → {off}"),
            Self::AtMost { bands, otherwise } => describe_bands(bands, *otherwise, "≤", ">"),
            Self::AtLeast { bands, otherwise } => describe_bands(bands, *otherwise, "≥", "<"),
        }
    }
}

fn describe_bands(bands: &[(f64, Score)], otherwise: Score, op: &str, rest: &str) -> String {
    let mut parts: Vec<String> = bands
        .iter()
        .map(|(bound, score)| format!("{op}{bound} → {score}"))
        .collect();
    if let Some((last, _)) = bands.last() {
        parts.push(format!("{rest}{last} → {otherwise}"));
    }
    parts.join(", ")
}

/// A signal scored by a fixed [`ScoreRule`].
#[derive(Debug, Clone)]
pub struct StepSignal {
    key: SignalKey,
    name: &'static str,
    ticker: &'static str,
    unit: Unit,
    rule: ScoreRule,
    threshold: String,
}

impl StepSignal {
    /// Create a signal; the threshold description is derived from the rule.
    #[must_use]
    pub fn new(
        key: SignalKey,
        name: &'static str,
        ticker: &'static str,
        unit: Unit,
        rule: ScoreRule,
    ) -> Self {
        Self {
            key,
            name,
            ticker,
            unit,
            rule,
            threshold: rule.describe(),
        }
    }

    /// The scoring rule.
    #[must_use]
    pub const fn rule(&self) -> &ScoreRule {
        &self.rule
    }

    /// Display unit.
    #[must_use]
    pub const fn unit(&self) -> Unit {
        self.unit
    }
}

impl Signal for StepSignal {
    fn key(&self) -> SignalKey {
        self.key
    }

    fn name(&self) -> &str {
        self.name
    }

    fn ticker(&self) -> &str {
        self.ticker
    }

    fn score(&self, value: &RawValue) -> Result<Score> {
        self.rule.apply(value)
    }

    fn score_range(&self) -> (Score, Score) {
        self.rule.range()
    }

    fn threshold(&self) -> &str {
        &self.threshold
    }

    fn display(&self, value: &RawValue) -> String {
        self.unit.format(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: ScoreRule = ScoreRule::AtMost {
        bands: &[(12.0, 100), (15.0, 85), (18.0, 70)],
        otherwise: 0,
    };

    const RATIO: ScoreRule = ScoreRule::AtLeast {
        bands: &[(2.0, 100), (1.0, 60)],
        otherwise: 20,
    };

    #[test]
    fn test_at_most_bounds_are_inclusive() {
        assert_eq!(LEVEL.apply(&RawValue::Number(12.0)).unwrap(), 100);
        assert_eq!(LEVEL.apply(&RawValue::Number(12.01)).unwrap(), 85);
        assert_eq!(LEVEL.apply(&RawValue::Number(15.0)).unwrap(), 85);
        assert_eq!(LEVEL.apply(&RawValue::Number(18.5)).unwrap(), 0);
        assert_eq!(LEVEL.apply(&RawValue::Number(-50.0)).unwrap(), 100);
    }

    #[test]
    fn test_at_least_bounds_are_inclusive() {
        assert_eq!(RATIO.apply(&RawValue::Number(2.0)).unwrap(), 100);
        assert_eq!(RATIO.apply(&RawValue::Number(1.99)).unwrap(), 60);
        assert_eq!(RATIO.apply(&RawValue::Number(0.99)).unwrap(), 20);
    }

    #[test]
    fn test_flag_rule() {
        let rule = ScoreRule::Flag { on: 70, off: 30 };
        assert_eq!(rule.apply(&RawValue::Flag(true)).unwrap(), 70);
        assert_eq!(rule.apply(&RawValue::Flag(false)).unwrap(), 30);
        assert_eq!(rule.range(), (30, 70));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        assert!(LEVEL.apply(&RawValue::Flag(true)).is_err());
        assert!(ScoreRule::Flag { on: 70, off: 30 }
            .apply(&RawValue::Number(1.0))
            .is_err());
        assert!(LEVEL.apply(&RawValue::Number(f64::NAN)).is_err());
    }

    #[test]
    fn test_range_includes_otherwise() {
        assert_eq!(LEVEL.range(), (0, 100));
        assert_eq!(RATIO.range(), (20, 100));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            LEVEL.describe(),
            "≤12 → 100, ≤15 → 85, ≤18 → 70, >18 → 0"
        );
        assert_eq!(RATIO.describe(), "≥2 → 100, ≥1 → 60, <1 → 20");
    }

    #[test]
    fn test_unit_format() {
        assert_eq!(Unit::Percent.format(&RawValue::Number(2.5)), "+2.50%");
        assert_eq!(Unit::Percent.format(&RawValue::Number(-1.25)), "-1.25%");
        assert_eq!(Unit::Ratio.format(&RawValue::Number(0.95)), "0.95");
        assert_eq!(Unit::Flag.format(&RawValue::Flag(true)), "Yes");
    }
}
