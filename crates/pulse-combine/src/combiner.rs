//! Core trait definition for pillar combiners and the fixed-weight combiner.

use ndarray::Array1;
use pulse_traits::{PillarKey, PulseError, Result, Score};
use serde::{Deserialize, Serialize};

/// Tolerance for the weights-sum-to-one check.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Resolution used for exact integer weighting.
const BASIS_POINTS: i64 = 10_000;

/// Score output from a single pillar for combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PillarScore {
    /// Pillar identifier
    pub pillar: PillarKey,

    /// Rounded pillar score
    pub score: Score,
}

/// Combines the six pillar scores into a composite.
///
/// Implementors define the weighting scheme. All implementations must be
/// thread-safe (Send + Sync) so one engine can serve concurrent refreshes.
pub trait Combiner: Send + Sync {
    /// Combine pillar scores into a composite score.
    ///
    /// # Errors
    ///
    /// Returns an error if a pillar is missing or repeated.
    fn combine(&self, pillars: &[PillarScore]) -> Result<Score>;

    /// Name of this combination strategy.
    fn name(&self) -> &str;
}

/// Fixed pillar weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarWeights {
    /// Direction pillar weight
    pub direction: f64,
    /// Breadth pillar weight
    pub breadth: f64,
    /// Volatility pillar weight
    pub volatility: f64,
    /// Credit pillar weight
    pub credit: f64,
    /// Sentiment pillar weight
    pub sentiment: f64,
    /// Global pillar weight
    pub global: f64,
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self {
            direction: 0.25,
            breadth: 0.20,
            volatility: 0.15,
            credit: 0.15,
            sentiment: 0.10,
            global: 0.15,
        }
    }
}

impl PillarWeights {
    /// Weight of one pillar.
    #[must_use]
    pub const fn get(&self, pillar: PillarKey) -> f64 {
        match pillar {
            PillarKey::Direction => self.direction,
            PillarKey::Breadth => self.breadth,
            PillarKey::Volatility => self.volatility,
            PillarKey::Credit => self.credit,
            PillarKey::Sentiment => self.sentiment,
            PillarKey::Global => self.global,
        }
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        PillarKey::ALL.iter().map(|&p| self.get(p)).sum()
    }

    /// Check that every weight lies in `(0, 1)` and the weights sum to 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::InvalidConfig`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        for pillar in PillarKey::ALL {
            let w = self.get(pillar);
            if !(w > 0.0 && w < 1.0) {
                return Err(PulseError::InvalidConfig(format!(
                    "weight for {pillar} must be in (0, 1), got {w}"
                )));
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PulseError::InvalidConfig(format!(
                "pillar weights must sum to 1.0, got {total}"
            )));
        }
        let bps: i64 = self.basis_points().sum();
        if bps != BASIS_POINTS {
            return Err(PulseError::InvalidConfig(format!(
                "pillar weights must resolve to whole basis points, got {bps}"
            )));
        }
        Ok(())
    }

    fn basis_points(&self) -> Array1<i64> {
        PillarKey::ALL
            .iter()
            .map(|&p| (self.get(p) * BASIS_POINTS as f64).round() as i64)
            .collect()
    }
}

/// Weighted-sum combiner over fixed pillar weights.
///
/// The reduction runs in integer basis points, so the composite is exact and
/// independent of the order pillars are supplied in.
///
/// # Examples
///
/// ```
/// use pulse_combine::{Combiner, PillarScore, PillarWeights, WeightedCombiner};
/// use pulse_traits::PillarKey;
///
/// let combiner = WeightedCombiner::new(PillarWeights::default()).unwrap();
/// let scores = [70, 60, 72, 55, 45, 65];
/// let pillars: Vec<_> = PillarKey::ALL
///     .into_iter()
///     .zip(scores)
///     .map(|(pillar, score)| PillarScore { pillar, score })
///     .collect();
///
/// assert_eq!(combiner.combine(&pillars).unwrap(), 63);
/// ```
#[derive(Debug, Clone)]
pub struct WeightedCombiner {
    weights: PillarWeights,
    basis_points: Array1<i64>,
}

impl WeightedCombiner {
    /// Create a combiner, validating the weights.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::InvalidConfig`] if the weights are invalid.
    pub fn new(weights: PillarWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            basis_points: weights.basis_points(),
            weights,
        })
    }

    /// The configured weights.
    #[must_use]
    pub const fn weights(&self) -> &PillarWeights {
        &self.weights
    }
}

impl Combiner for WeightedCombiner {
    fn combine(&self, pillars: &[PillarScore]) -> Result<Score> {
        let mut slots: [Option<Score>; 6] = [None; 6];
        for p in pillars {
            let slot = &mut slots[p.pillar as usize];
            if slot.replace(p.score).is_some() {
                return Err(PulseError::InvalidData(format!(
                    "pillar {} supplied twice",
                    p.pillar
                )));
            }
        }

        let scores = slots
            .iter()
            .zip(PillarKey::ALL)
            .map(|(slot, pillar)| {
                slot.map(i64::from)
                    .ok_or_else(|| PulseError::InvalidData(format!("pillar {pillar} missing")))
            })
            .collect::<Result<Array1<i64>>>()?;

        let weighted = scores.dot(&self.basis_points);
        // round half up of weighted / BASIS_POINTS
        let composite = (2 * weighted + BASIS_POINTS) / (2 * BASIS_POINTS);
        Ok(composite.clamp(0, 100) as Score)
    }

    fn name(&self) -> &str {
        "weighted"
    }
}
