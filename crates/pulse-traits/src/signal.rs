//! Signal trait for scoring a single market indicator.
//!
//! This module defines the `Signal` trait, the core abstraction that maps one
//! raw indicator value to an integer health score. Implementations are pure:
//! the same raw value always yields the same score.

use crate::{PillarKey, RawValue, Result, Score, SignalKey};

/// A scored market indicator.
///
/// Implementations should be thread-safe (`Send + Sync`) so a single
/// registry can be shared by concurrent refresh cycles.
///
/// # Score Range
///
/// A signal's achievable scores may be a strict subset of `[0, 100]`. For
/// example, contrarian sentiment readings never reach either extreme. The
/// closed range is reported by [`Signal::score_range`] and every score
/// returned by [`Signal::score`] must lie inside it.
///
/// # Example
///
/// ```
/// use pulse_traits::{PillarKey, RawValue, Result, Score, Signal, SignalKey};
///
/// struct AlwaysNeutral;
///
/// impl Signal for AlwaysNeutral {
///     fn key(&self) -> SignalKey {
///         SignalKey::FearGreed
///     }
///
///     fn name(&self) -> &str {
///         "Always neutral"
///     }
///
///     fn ticker(&self) -> &str {
///         "NONE"
///     }
///
///     fn score(&self, _value: &RawValue) -> Result<Score> {
///         Ok(50)
///     }
///
///     fn score_range(&self) -> (Score, Score) {
///         (50, 50)
///     }
///
///     fn threshold(&self) -> &str {
///         "always 50"
///     }
/// }
///
/// assert_eq!(AlwaysNeutral.pillar(), PillarKey::Sentiment);
/// ```
pub trait Signal: Send + Sync {
    /// The identifier of this signal.
    fn key(&self) -> SignalKey;

    /// Human-readable name used in reports.
    fn name(&self) -> &str;

    /// Source instrument the raw value is derived from.
    fn ticker(&self) -> &str;

    /// Maps a raw value to a score.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PulseError::InvalidData`] if the value has the wrong
    /// shape for this signal or is not finite.
    fn score(&self, value: &RawValue) -> Result<Score>;

    /// Closed range of scores this signal can produce.
    fn score_range(&self) -> (Score, Score);

    /// Description of the scoring bands.
    fn threshold(&self) -> &str;

    /// The pillar this signal contributes to.
    fn pillar(&self) -> PillarKey {
        self.key().pillar()
    }

    /// Formats a raw value for display.
    fn display(&self, value: &RawValue) -> String {
        value.display()
    }
}
