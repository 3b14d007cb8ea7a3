//! Scored signal readings.

use pulse_traits::{RawSignalValue, RawValue, Score, Signal, SignalKey};
use serde::Serialize;
use tracing::warn;

use crate::defaults::fallback_value;

/// One scored indicator as presented in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReading {
    /// Signal identifier.
    pub key: SignalKey,
    /// Human-readable name.
    pub name: String,
    /// Source instrument.
    pub ticker: String,
    /// Raw value the score was computed from.
    pub raw_value: RawValue,
    /// Formatted raw value.
    pub display_value: String,
    /// Change reported by the source, if any.
    pub delta: Option<f64>,
    /// Integer score.
    pub score: Score,
    /// Band description.
    pub threshold: String,
    /// Whether the value came from the fallback table.
    pub is_fallback: bool,
}

/// Score a signal against its raw value, substituting the fallback table when
/// the value is absent or fails validation.
#[must_use]
pub fn read(signal: &dyn Signal, raw: Option<&RawSignalValue>) -> SignalReading {
    let resolved = raw.and_then(|raw| match signal.score(&raw.value) {
        Ok(score) => Some((raw.value, raw.delta, score)),
        Err(e) => {
            warn!(signal = %signal.key(), error = %e, "rejected raw value, using fallback");
            None
        }
    });

    let (raw_value, delta, score, is_fallback) = match resolved {
        Some((value, delta, score)) => (value, delta, score, false),
        None => {
            let value = fallback_value(signal.key());
            // fallback table is validated by tests; the range floor is the last resort
            let score = signal
                .score(&value)
                .unwrap_or_else(|_| signal.score_range().0);
            (value, None, score, true)
        }
    };

    SignalReading {
        key: signal.key(),
        name: signal.name().to_string(),
        ticker: signal.ticker().to_string(),
        raw_value,
        display_value: signal.display(&raw_value),
        delta,
        score,
        threshold: signal.threshold().to_string(),
        is_fallback,
    }
}
