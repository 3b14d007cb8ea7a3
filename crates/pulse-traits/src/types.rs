//! Common types used throughout the Pulse engine.
//!
//! This module defines the identifiers for the 18 signals and 6 pillars, the
//! tagged raw value model produced by data sources, and the per-cycle
//! [`Snapshot`] that the scoring engine consumes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::PulseError;

/// An integer score in `[0, 100]`.
pub type Score = u8;

/// Themed group of three signals with a fixed weight in the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PillarKey {
    /// Trend and momentum of the broad index.
    Direction,
    /// Participation across index members.
    Breadth,
    /// Implied volatility level and term structure.
    Volatility,
    /// Corporate credit spreads and the yield curve.
    Credit,
    /// Contrarian positioning and survey sentiment.
    Sentiment,
    /// Dollar, international equities and growth-sensitive commodities.
    Global,
}

impl PillarKey {
    /// All pillars in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Direction,
        Self::Breadth,
        Self::Volatility,
        Self::Credit,
        Self::Sentiment,
        Self::Global,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Direction => "direction",
            Self::Breadth => "breadth",
            Self::Volatility => "volatility",
            Self::Credit => "credit",
            Self::Sentiment => "sentiment",
            Self::Global => "global",
        }
    }

    /// The three signals that make up this pillar.
    #[must_use]
    pub fn signals(&self) -> [SignalKey; 3] {
        use SignalKey as K;
        match self {
            Self::Direction => [K::SpxVs200Dma, K::SpxMomentum20d, K::GoldenCross],
            Self::Breadth => [
                K::PctAbove200Dma,
                K::AdvanceDeclineRatio,
                K::HighsLowsRatio,
            ],
            Self::Volatility => [K::VixLevel, K::VixTermRatio, K::VixContango],
            Self::Credit => [K::HySpread, K::IgSpread, K::YieldCurvePositive],
            Self::Sentiment => [K::FearGreed, K::PutCallRatio, K::AaiiSpread],
            Self::Global => [
                K::DollarChange20d,
                K::WorldExUsVs200Dma,
                K::CopperGoldChange20d,
            ],
        }
    }
}

impl fmt::Display for PillarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PillarKey {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PulseError::InvalidData(format!("unknown pillar: {s}")))
    }
}

/// Identifier of one scored market indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalKey {
    /// Percent distance of the S&P 500 from its 200-day moving average.
    #[serde(rename = "spx_vs_200dma")]
    SpxVs200Dma,
    /// S&P 500 20-day return in percent.
    #[serde(rename = "spx_momentum_20d")]
    SpxMomentum20d,
    /// 50-day moving average above the 200-day.
    #[serde(rename = "golden_cross")]
    GoldenCross,
    /// Estimated percent of index members above their 200-day average.
    #[serde(rename = "pct_above_200dma")]
    PctAbove200Dma,
    /// Advancing issues over declining issues.
    #[serde(rename = "advance_decline_ratio")]
    AdvanceDeclineRatio,
    /// New highs over new lows.
    #[serde(rename = "highs_lows_ratio")]
    HighsLowsRatio,
    /// Spot implied volatility index.
    #[serde(rename = "vix_level")]
    VixLevel,
    /// Spot volatility index over its 3-month counterpart.
    #[serde(rename = "vix_term_ratio")]
    VixTermRatio,
    /// Volatility futures curve in contango.
    #[serde(rename = "vix_contango")]
    VixContango,
    /// High-yield option-adjusted spread in percent.
    #[serde(rename = "hy_spread")]
    HySpread,
    /// Investment-grade option-adjusted spread in percent.
    #[serde(rename = "ig_spread")]
    IgSpread,
    /// 10-year minus 2-year Treasury spread is positive.
    #[serde(rename = "yield_curve_positive")]
    YieldCurvePositive,
    /// Fear & greed index, 0 to 100.
    #[serde(rename = "fear_greed")]
    FearGreed,
    /// Equity put/call ratio.
    #[serde(rename = "put_call_ratio")]
    PutCallRatio,
    /// AAII bulls minus bears in percentage points.
    #[serde(rename = "aaii_spread")]
    AaiiSpread,
    /// Dollar index 20-day change in percent.
    #[serde(rename = "dollar_change_20d")]
    DollarChange20d,
    /// World ex-US equities percent distance from the 200-day average.
    #[serde(rename = "world_ex_us_vs_200dma")]
    WorldExUsVs200Dma,
    /// Copper/gold ratio 20-day change in percent.
    #[serde(rename = "copper_gold_change_20d")]
    CopperGoldChange20d,
}

impl SignalKey {
    /// All signals, grouped by pillar in canonical order.
    pub const ALL: [Self; 18] = [
        Self::SpxVs200Dma,
        Self::SpxMomentum20d,
        Self::GoldenCross,
        Self::PctAbove200Dma,
        Self::AdvanceDeclineRatio,
        Self::HighsLowsRatio,
        Self::VixLevel,
        Self::VixTermRatio,
        Self::VixContango,
        Self::HySpread,
        Self::IgSpread,
        Self::YieldCurvePositive,
        Self::FearGreed,
        Self::PutCallRatio,
        Self::AaiiSpread,
        Self::DollarChange20d,
        Self::WorldExUsVs200Dma,
        Self::CopperGoldChange20d,
    ];

    /// Stable identifier, also used as the cache and wire key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SpxVs200Dma => "spx_vs_200dma",
            Self::SpxMomentum20d => "spx_momentum_20d",
            Self::GoldenCross => "golden_cross",
            Self::PctAbove200Dma => "pct_above_200dma",
            Self::AdvanceDeclineRatio => "advance_decline_ratio",
            Self::HighsLowsRatio => "highs_lows_ratio",
            Self::VixLevel => "vix_level",
            Self::VixTermRatio => "vix_term_ratio",
            Self::VixContango => "vix_contango",
            Self::HySpread => "hy_spread",
            Self::IgSpread => "ig_spread",
            Self::YieldCurvePositive => "yield_curve_positive",
            Self::FearGreed => "fear_greed",
            Self::PutCallRatio => "put_call_ratio",
            Self::AaiiSpread => "aaii_spread",
            Self::DollarChange20d => "dollar_change_20d",
            Self::WorldExUsVs200Dma => "world_ex_us_vs_200dma",
            Self::CopperGoldChange20d => "copper_gold_change_20d",
        }
    }

    /// The pillar this signal belongs to.
    #[must_use]
    pub const fn pillar(&self) -> PillarKey {
        match self {
            Self::SpxVs200Dma | Self::SpxMomentum20d | Self::GoldenCross => PillarKey::Direction,
            Self::PctAbove200Dma | Self::AdvanceDeclineRatio | Self::HighsLowsRatio => {
                PillarKey::Breadth
            }
            Self::VixLevel | Self::VixTermRatio | Self::VixContango => PillarKey::Volatility,
            Self::HySpread | Self::IgSpread | Self::YieldCurvePositive => PillarKey::Credit,
            Self::FearGreed | Self::PutCallRatio | Self::AaiiSpread => PillarKey::Sentiment,
            Self::DollarChange20d | Self::WorldExUsVs200Dma | Self::CopperGoldChange20d => {
                PillarKey::Global
            }
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKey {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| PulseError::SignalNotFound(s.to_string()))
    }
}

/// Raw value of an indicator as normalized by a data source.
///
/// Percentages and ratios are plain floats; regime flags are booleans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Boolean regime flag.
    Flag(bool),
    /// Numeric reading.
    Number(f64),
}

impl RawValue {
    /// The numeric reading, if this is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Flag(_) => None,
        }
    }

    /// The flag, if this is a boolean.
    #[must_use]
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Number(_) => None,
        }
    }

    /// Flags are always valid; numbers must be finite.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        match self {
            Self::Flag(_) => true,
            Self::Number(v) => v.is_finite(),
        }
    }

    /// Human readable rendering.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Flag(true) => "Yes".to_string(),
            Self::Flag(false) => "No".to_string(),
            Self::Number(v) => format!("{v:.2}"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

/// One raw reading for a signal, immutable for the fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSignalValue {
    /// Which signal this value feeds.
    pub key: SignalKey,
    /// The reading itself.
    pub value: RawValue,
    /// Change since the previous reading, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

impl RawSignalValue {
    /// Create a value without a delta.
    #[must_use]
    pub fn new(key: SignalKey, value: impl Into<RawValue>) -> Self {
        Self {
            key,
            value: value.into(),
            delta: None,
        }
    }

    /// Attach a delta.
    #[must_use]
    pub const fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }
}

/// All raw values resolved during one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    values: BTreeMap<SignalKey, RawSignalValue>,
}

impl Snapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the same key.
    pub fn insert(&mut self, value: RawSignalValue) {
        self.values.insert(value.key, value);
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: SignalKey) -> Option<&RawSignalValue> {
        self.values.get(&key)
    }

    /// Number of resolved signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no signal resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Signals with no resolved value, in canonical order.
    #[must_use]
    pub fn missing(&self) -> Vec<SignalKey> {
        SignalKey::ALL
            .into_iter()
            .filter(|k| !self.values.contains_key(k))
            .collect()
    }

    /// Iterate over resolved values in key order.
    pub fn iter(&self) -> impl Iterator<Item = &RawSignalValue> {
        self.values.values()
    }
}

impl FromIterator<RawSignalValue> for Snapshot {
    fn from_iter<I: IntoIterator<Item = RawSignalValue>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for value in iter {
            snapshot.insert(value);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pillar_has_three_distinct_signals() {
        let mut seen = Vec::new();
        for pillar in PillarKey::ALL {
            for key in pillar.signals() {
                assert_eq!(key.pillar(), pillar);
                assert!(!seen.contains(&key));
                seen.push(key);
            }
        }
        assert_eq!(seen.len(), SignalKey::ALL.len());
    }

    #[test]
    fn test_signal_key_round_trips_through_str() {
        for key in SignalKey::ALL {
            assert_eq!(key.as_str().parse::<SignalKey>().unwrap(), key);
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
        assert!("not_a_signal".parse::<SignalKey>().is_err());
    }

    #[test]
    fn test_raw_value_untagged_decode() {
        let flag: RawValue = serde_json::from_str("true").unwrap();
        assert_eq!(flag, RawValue::Flag(true));

        let number: RawValue = serde_json::from_str("14.5").unwrap();
        assert_eq!(number.as_number(), Some(14.5));
        assert_eq!(number.as_flag(), None);
    }

    #[test]
    fn test_raw_value_validity() {
        assert!(RawValue::Number(1.0).is_valid());
        assert!(!RawValue::Number(f64::NAN).is_valid());
        assert!(!RawValue::Number(f64::INFINITY).is_valid());
        assert!(RawValue::Flag(false).is_valid());
    }

    #[test]
    fn test_snapshot_missing_keys() {
        let snapshot: Snapshot = [
            RawSignalValue::new(SignalKey::VixLevel, 14.0),
            RawSignalValue::new(SignalKey::VixContango, true).with_delta(0.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.len(), 2);
        let missing = snapshot.missing();
        assert_eq!(missing.len(), 16);
        assert!(!missing.contains(&SignalKey::VixLevel));
        assert!(missing.contains(&SignalKey::HySpread));
    }
}
