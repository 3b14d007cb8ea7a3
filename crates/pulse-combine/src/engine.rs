//! Snapshot scoring.

use std::collections::BTreeMap;

use pulse_signals::{MISSING_SIGNAL_THRESHOLD, SignalReading, SignalRegistry, read};
use pulse_traits::{PillarKey, PulseError, Result, Score, SignalKey, Snapshot};
use serde::Serialize;
use tracing::debug;

use crate::agreement::AgreementSummary;
use crate::combiner::{Combiner, PillarScore, PillarWeights, WeightedCombiner};
use crate::pillar::Pillar;
use crate::status::HealthStatus;

/// Result of scoring one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeReport {
    /// Weighted composite score.
    pub score: Score,
    /// Status band of the composite.
    pub status: HealthStatus,
    /// All six pillars.
    pub pillars: BTreeMap<PillarKey, Pillar>,
    /// Bullish/bearish partition of the pillar scores.
    pub agreement: AgreementSummary,
    /// Signals scored from the fallback table.
    pub missing: Vec<SignalKey>,
    /// Whether too many signals were missing for the score to be trusted.
    pub incomplete: bool,
}

impl CompositeReport {
    /// Pillar scores keyed by pillar.
    #[must_use]
    pub fn pillar_scores(&self) -> BTreeMap<PillarKey, Score> {
        self.pillars.iter().map(|(k, p)| (*k, p.score)).collect()
    }

    /// Look up one pillar.
    #[must_use]
    pub fn pillar(&self, key: PillarKey) -> Option<&Pillar> {
        self.pillars.get(&key)
    }
}

/// Scores snapshots against the standard signal set and fixed pillar weights.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    registry: SignalRegistry,
    combiner: WeightedCombiner,
    missing_threshold: usize,
}

impl ScoringEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::InvalidConfig`] if the weights are invalid.
    pub fn new(weights: PillarWeights) -> Result<Self> {
        Ok(Self {
            registry: SignalRegistry::standard(),
            combiner: WeightedCombiner::new(weights)?,
            missing_threshold: MISSING_SIGNAL_THRESHOLD,
        })
    }

    /// Override how many missing signals are tolerated before a report is
    /// flagged incomplete.
    #[must_use]
    pub const fn with_missing_threshold(mut self, threshold: usize) -> Self {
        self.missing_threshold = threshold;
        self
    }

    /// The signal registry.
    #[must_use]
    pub const fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    /// The pillar weights.
    #[must_use]
    pub const fn weights(&self) -> &PillarWeights {
        self.combiner.weights()
    }

    /// Score a snapshot.
    ///
    /// Absent or invalid values are replaced from the fallback table, so
    /// every pillar always has three readings.
    ///
    /// # Errors
    ///
    /// Returns an error only if the registry is missing a signal, which the
    /// standard registry never is.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Result<CompositeReport> {
        let mut pillars = BTreeMap::new();
        for key in PillarKey::ALL {
            let pillar = self.pillar(key, snapshot)?;
            pillars.insert(key, pillar);
        }

        let inputs: Vec<PillarScore> = pillars.values().map(Pillar::as_score).collect();
        let score = self.combiner.combine(&inputs)?;
        let pillar_scores: Vec<Score> = inputs.iter().map(|p| p.score).collect();

        let missing: Vec<SignalKey> = pillars
            .values()
            .flat_map(|p| p.signals.iter())
            .filter(|s| s.is_fallback)
            .map(|s| s.key)
            .collect();
        let incomplete = missing.len() > self.missing_threshold;

        debug!(
            score,
            missing = missing.len(),
            incomplete,
            combiner = self.combiner.name(),
            "evaluated snapshot"
        );

        Ok(CompositeReport {
            score,
            status: HealthStatus::from_score(score),
            pillars,
            agreement: AgreementSummary::classify(&pillar_scores),
            missing,
            incomplete,
        })
    }

    fn pillar(&self, key: PillarKey, snapshot: &Snapshot) -> Result<Pillar> {
        let readings = key
            .signals()
            .into_iter()
            .map(|signal_key| {
                self.registry
                    .get(signal_key)
                    .map(|signal| read(signal, snapshot.get(signal_key)))
                    .ok_or_else(|| PulseError::SignalNotFound(signal_key.to_string()))
            })
            .collect::<Result<Vec<SignalReading>>>()?;

        let signals: [SignalReading; 3] = readings.try_into().map_err(|_| {
            PulseError::InvalidData(format!("pillar {key} must have exactly 3 signals"))
        })?;
        Ok(Pillar::new(key, self.weights().get(key), signals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::Agreement;
    use pulse_signals::fallback_value;
    use pulse_traits::RawSignalValue;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(PillarWeights::default()).unwrap()
    }

    fn fallback_snapshot() -> Snapshot {
        SignalKey::ALL
            .into_iter()
            .map(|k| RawSignalValue::new(k, fallback_value(k)))
            .collect()
    }

    #[test]
    fn test_empty_snapshot_uses_fallbacks() {
        let report = engine().evaluate(&Snapshot::new()).unwrap();
        assert_eq!(report.pillars.len(), 6);
        assert_eq!(report.missing.len(), 18);
        assert!(report.incomplete);

        let scores = report.pillar_scores();
        assert_eq!(scores[&PillarKey::Direction], 65);
        assert_eq!(scores[&PillarKey::Breadth], 58);
        assert_eq!(scores[&PillarKey::Volatility], 60);
        assert_eq!(scores[&PillarKey::Credit], 60);
        assert_eq!(scores[&PillarKey::Sentiment], 55);
        assert_eq!(scores[&PillarKey::Global], 67);
        assert_eq!(report.score, 61);
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.agreement.verdict, Agreement::LeaningPositive);
    }

    #[test]
    fn test_full_snapshot_is_complete() {
        let report = engine().evaluate(&fallback_snapshot()).unwrap();
        assert!(report.missing.is_empty());
        assert!(!report.incomplete);
        assert_eq!(report.score, 61);
        assert!(
            report
                .pillars
                .values()
                .all(|p| p.fallback_count() == 0 && p.signals.len() == 3)
        );
    }

    #[test]
    fn test_incomplete_threshold() {
        let engine = engine();
        let full = fallback_snapshot();

        // drop six: still complete
        let snapshot: Snapshot = full.iter().skip(6).copied().collect();
        let report = engine.evaluate(&snapshot).unwrap();
        assert_eq!(report.missing.len(), 6);
        assert!(!report.incomplete);

        // drop seven: incomplete
        let snapshot: Snapshot = full.iter().skip(7).copied().collect();
        let report = engine.evaluate(&snapshot).unwrap();
        assert_eq!(report.missing.len(), 7);
        assert!(report.incomplete);
    }

    #[test]
    fn test_invalid_value_counts_as_missing() {
        let mut snapshot = fallback_snapshot();
        snapshot.insert(RawSignalValue::new(SignalKey::GoldenCross, 1.0));
        let report = engine().evaluate(&snapshot).unwrap();
        assert_eq!(report.missing, vec![SignalKey::GoldenCross]);
        let direction = report.pillar(PillarKey::Direction).unwrap();
        assert_eq!(direction.fallback_count(), 1);
    }

    #[test]
    fn test_stressed_market() {
        let snapshot: Snapshot = [
            RawSignalValue::new(SignalKey::SpxVs200Dma, -12.0),
            RawSignalValue::new(SignalKey::SpxMomentum20d, -8.0),
            RawSignalValue::new(SignalKey::GoldenCross, false),
            RawSignalValue::new(SignalKey::PctAbove200Dma, 20.0),
            RawSignalValue::new(SignalKey::AdvanceDeclineRatio, 0.4),
            RawSignalValue::new(SignalKey::HighsLowsRatio, 0.2),
            RawSignalValue::new(SignalKey::VixLevel, 40.0),
            RawSignalValue::new(SignalKey::VixTermRatio, 1.2),
            RawSignalValue::new(SignalKey::VixContango, false),
            RawSignalValue::new(SignalKey::HySpread, 8.0),
            RawSignalValue::new(SignalKey::IgSpread, 2.5),
            RawSignalValue::new(SignalKey::YieldCurvePositive, false),
            RawSignalValue::new(SignalKey::FearGreed, 10.0),
            RawSignalValue::new(SignalKey::PutCallRatio, 1.3),
            RawSignalValue::new(SignalKey::AaiiSpread, -30.0),
            RawSignalValue::new(SignalKey::DollarChange20d, 5.0),
            RawSignalValue::new(SignalKey::WorldExUsVs200Dma, -8.0),
            RawSignalValue::new(SignalKey::CopperGoldChange20d, -5.0),
        ]
        .into_iter()
        .collect();

        let report = engine().evaluate(&snapshot).unwrap();
        assert!(report.missing.is_empty());
        assert_eq!(report.pillar_scores()[&PillarKey::Sentiment], 95);
        assert_eq!(report.status, HealthStatus::VeryUnhealthy);
        assert_eq!(report.agreement.verdict, Agreement::StrongBearish);
    }

    #[test]
    fn test_report_serializes() {
        let report = engine().evaluate(&fallback_snapshot()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["score"], 61);
        assert!(json["pillars"]["volatility"]["signals"].is_array());
    }
}
