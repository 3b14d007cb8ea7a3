//! Qualitative health bands for the composite score.

use pulse_traits::Score;
use serde::Serialize;
use std::fmt;

/// Qualitative band of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Below 25.
    VeryUnhealthy,
    /// 25 to 44.
    Unhealthy,
    /// 45 to 59.
    Neutral,
    /// 60 to 74.
    Healthy,
    /// 75 and above.
    VeryHealthy,
}

impl HealthStatus {
    /// Band lower bounds, highest first.
    const BANDS: [(Score, Self); 4] = [
        (75, Self::VeryHealthy),
        (60, Self::Healthy),
        (45, Self::Neutral),
        (25, Self::Unhealthy),
    ];

    /// Classify a composite score.
    #[must_use]
    pub fn from_score(score: Score) -> Self {
        Self::BANDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map_or(Self::VeryUnhealthy, |&(_, status)| status)
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::VeryHealthy => "Very Healthy",
            Self::Healthy => "Healthy",
            Self::Neutral => "Neutral",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
