//! Pillar aggregation.

use pulse_signals::SignalReading;
use pulse_traits::{PillarKey, Score, stats::rounded_mean};
use serde::Serialize;

use crate::combiner::PillarScore;

/// A themed group of exactly three scored signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pillar {
    /// Pillar identifier.
    pub key: PillarKey,
    /// Weight of this pillar in the composite.
    pub weight: f64,
    /// Round-half-up mean of the member scores.
    pub score: Score,
    /// Member readings in canonical order.
    pub signals: [SignalReading; 3],
}

impl Pillar {
    /// Build a pillar from its three readings.
    #[must_use]
    pub fn new(key: PillarKey, weight: f64, signals: [SignalReading; 3]) -> Self {
        let scores = signals.each_ref().map(|s| s.score);
        Self {
            key,
            weight,
            score: rounded_mean(&scores).unwrap_or_default(),
            signals,
        }
    }

    /// Number of members scored from the fallback table.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.signals.iter().filter(|s| s.is_fallback).count()
    }

    /// The pillar's contribution as a combiner input.
    #[must_use]
    pub const fn as_score(&self) -> PillarScore {
        PillarScore {
            pillar: self.key,
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_signals::{SignalRegistry, read};
    use pulse_traits::{RawSignalValue, SignalKey};

    fn reading(key: SignalKey, value: RawSignalValue) -> SignalReading {
        let registry = SignalRegistry::standard();
        read(registry.get(key).unwrap(), Some(&value))
    }

    #[test]
    fn test_volatility_pillar_scenario() {
        let vix = reading(
            SignalKey::VixLevel,
            RawSignalValue::new(SignalKey::VixLevel, 14.0),
        );
        let ratio = reading(
            SignalKey::VixTermRatio,
            RawSignalValue::new(SignalKey::VixTermRatio, 0.95),
        );
        let contango = reading(
            SignalKey::VixContango,
            RawSignalValue::new(SignalKey::VixContango, true),
        );
        assert_eq!((vix.score, ratio.score, contango.score), (85, 60, 70));

        let pillar = Pillar::new(PillarKey::Volatility, 0.15, [vix, ratio, contango]);
        assert_eq!(pillar.score, 72);
        assert_eq!(pillar.fallback_count(), 0);
    }

    #[test]
    fn test_pillar_score_order_invariant() {
        let a = reading(
            SignalKey::VixLevel,
            RawSignalValue::new(SignalKey::VixLevel, 14.0),
        );
        let b = reading(
            SignalKey::VixTermRatio,
            RawSignalValue::new(SignalKey::VixTermRatio, 1.05),
        );
        let c = reading(
            SignalKey::VixContango,
            RawSignalValue::new(SignalKey::VixContango, false),
        );

        let forward = Pillar::new(PillarKey::Volatility, 0.15, [a.clone(), b.clone(), c.clone()]);
        let shuffled = Pillar::new(PillarKey::Volatility, 0.15, [c, a, b]);
        assert_eq!(forward.score, shuffled.score);
        // (85 + 20 + 30) / 3 = 45
        assert_eq!(forward.score, 45);
    }
}
