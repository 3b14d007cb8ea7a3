//! Signal registry for discovering and scoring the standard signal set.
//!
//! This module provides metadata and lookup for all 18 signals, grouped by
//! pillar.

use pulse_traits::{PillarKey, Score, Signal, SignalKey};
use serde::Serialize;

use crate::pillars;
use crate::rule::StepSignal;

/// Metadata about a signal.
#[derive(Debug, Clone, Serialize)]
pub struct SignalInfo {
    /// Unique identifier for the signal
    pub key: SignalKey,

    /// Pillar classification
    pub pillar: PillarKey,

    /// Human-readable name
    pub name: String,

    /// Source instrument
    pub ticker: String,

    /// Band description
    pub threshold: String,

    /// Achievable score range
    pub range: (Score, Score),
}

impl SignalInfo {
    fn of(signal: &dyn Signal) -> Self {
        Self {
            key: signal.key(),
            pillar: signal.pillar(),
            name: signal.name().to_string(),
            ticker: signal.ticker().to_string(),
            threshold: signal.threshold().to_string(),
            range: signal.score_range(),
        }
    }
}

/// The standard signal set, indexed by key.
#[derive(Debug, Clone)]
pub struct SignalRegistry {
    signals: Vec<StepSignal>,
}

impl SignalRegistry {
    /// All 18 signals in canonical order.
    #[must_use]
    pub fn standard() -> Self {
        let signals = PillarKey::ALL
            .into_iter()
            .flat_map(pillars::signals_for)
            .collect();
        Self { signals }
    }

    /// Look up a signal by key.
    #[must_use]
    pub fn get(&self, key: SignalKey) -> Option<&StepSignal> {
        self.signals.iter().find(|s| s.key() == key)
    }

    /// Iterate over all signals.
    pub fn iter(&self) -> impl Iterator<Item = &StepSignal> {
        self.signals.iter()
    }

    /// The signals of one pillar.
    pub fn by_pillar(&self, pillar: PillarKey) -> impl Iterator<Item = &StepSignal> {
        self.signals.iter().filter(move |s| s.pillar() == pillar)
    }

    /// Number of registered signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl Default for SignalRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Get information about all available signals.
#[must_use]
pub fn available_signals() -> Vec<SignalInfo> {
    SignalRegistry::standard()
        .iter()
        .map(|s| SignalInfo::of(s))
        .collect()
}

/// Get all signals in a specific pillar.
#[must_use]
pub fn signals_by_pillar(pillar: PillarKey) -> Vec<SignalInfo> {
    available_signals()
        .into_iter()
        .filter(|info| info.pillar == pillar)
        .collect()
}

/// Get information about a specific signal by name.
#[must_use]
pub fn get_signal_info(name: &str) -> Option<SignalInfo> {
    available_signals()
        .into_iter()
        .find(|info| info.key.as_str() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_traits::RawValue;

    #[test]
    fn test_registry_covers_every_key_once() {
        let registry = SignalRegistry::standard();
        assert_eq!(registry.len(), 18);
        for key in SignalKey::ALL {
            assert!(registry.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_registry_matches_pillar_membership() {
        let registry = SignalRegistry::standard();
        for pillar in PillarKey::ALL {
            let keys: Vec<_> = registry.by_pillar(pillar).map(|s| s.key()).collect();
            assert_eq!(keys, pillar.signals().to_vec());
        }
    }

    #[test]
    fn test_signals_by_pillar() {
        for pillar in PillarKey::ALL {
            assert_eq!(signals_by_pillar(pillar).len(), 3);
        }
    }

    #[test]
    fn test_get_signal_info() {
        let info = get_signal_info("vix_level").unwrap();
        assert_eq!(info.pillar, PillarKey::Volatility);
        assert_eq!(info.range, (0, 100));
        assert!(info.threshold.starts_with("≤12 → 100"));

        assert!(get_signal_info("nonexistent_signal").is_none());
    }

    #[test]
    fn test_scores_stay_in_documented_range() {
        let probes = [
            -1.0e12, -1000.0, -50.0, -10.0, -5.0, -2.0, -0.5, 0.0, 0.5, 0.75, 0.85, 0.9, 0.95, 1.0,
            1.1, 1.5, 2.0, 3.0, 5.0, 12.0, 15.0, 22.0, 35.0, 50.0, 70.0, 100.0, 1000.0, 1.0e12,
            f64::MAX, f64::MIN,
        ];
        let registry = SignalRegistry::standard();
        for signal in registry.iter() {
            let (lo, hi) = signal.score_range();
            assert!(lo <= hi && hi <= 100);
            let values: Vec<RawValue> = match signal.score(&RawValue::Flag(true)) {
                Ok(_) => vec![RawValue::Flag(true), RawValue::Flag(false)],
                Err(_) => probes.iter().map(|&v| RawValue::Number(v)).collect(),
            };
            for value in values {
                let score = signal.score(&value).unwrap();
                assert!(
                    (lo..=hi).contains(&score),
                    "{} scored {score} outside [{lo}, {hi}]",
                    signal.key()
                );
            }
        }
    }
}
