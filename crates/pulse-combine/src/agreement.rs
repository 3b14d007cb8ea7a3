//! Cross-pillar agreement.

use pulse_traits::Score;
use serde::Serialize;

/// Pillar scores at or above this are bullish.
pub const BULLISH_FLOOR: Score = 60;

/// Pillar scores below this are bearish.
pub const BEARISH_CEILING: Score = 45;

/// How strongly the pillars agree with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Agreement {
    /// Five or more bullish pillars.
    StrongBullish,
    /// Four bullish pillars.
    LeaningPositive,
    /// No side has four pillars.
    Mixed,
    /// Four bearish pillars.
    LeaningNegative,
    /// Five or more bearish pillars.
    StrongBearish,
}

impl Agreement {
    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::StrongBullish => "Strong Bullish",
            Self::LeaningPositive => "Leaning Positive",
            Self::Mixed => "Mixed",
            Self::LeaningNegative => "Leaning Negative",
            Self::StrongBearish => "Strong Bearish",
        }
    }
}

/// Partition of pillar scores into bullish, neutral and bearish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgreementSummary {
    /// Pillars scoring at least [`BULLISH_FLOOR`].
    pub bullish: usize,
    /// Pillars in `[BEARISH_CEILING, BULLISH_FLOOR)`.
    pub neutral: usize,
    /// Pillars below [`BEARISH_CEILING`].
    pub bearish: usize,
    /// Overall verdict.
    pub verdict: Agreement,
}

impl AgreementSummary {
    /// Classify a set of pillar scores.
    #[must_use]
    pub fn classify(scores: &[Score]) -> Self {
        let bullish = scores.iter().filter(|&&s| s >= BULLISH_FLOOR).count();
        let bearish = scores.iter().filter(|&&s| s < BEARISH_CEILING).count();
        let neutral = scores.len() - bullish - bearish;

        let verdict = match (bullish, bearish) {
            (b, _) if b >= 5 => Agreement::StrongBullish,
            (_, b) if b >= 5 => Agreement::StrongBearish,
            (b, _) if b >= 4 => Agreement::LeaningPositive,
            (_, b) if b >= 4 => Agreement::LeaningNegative,
            _ => Agreement::Mixed,
        };

        Self {
            bullish,
            neutral,
            bearish,
            verdict,
        }
    }
}
