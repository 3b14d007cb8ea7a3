//! Integer statistics shared by the scoring and history crates.
//!
//! Scores are integers, so means and ranks are computed in integer arithmetic
//! to keep every result exact and reproducible across platforms.

use crate::Score;

/// Round-half-up mean of a set of scores.
///
/// Returns `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use pulse_traits::stats::rounded_mean;
///
/// assert_eq!(rounded_mean(&[85, 60, 70]), Some(72));
/// assert_eq!(rounded_mean(&[50, 51]), Some(51));
/// assert_eq!(rounded_mean(&[]), None);
/// ```
#[must_use]
pub fn rounded_mean(scores: &[Score]) -> Option<Score> {
    if scores.is_empty() {
        return None;
    }
    let n = scores.len() as u64;
    let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    // floor(sum / n + 1/2) without leaving the integers
    let mean = (2 * sum + n) / (2 * n);
    Some(mean.min(100) as Score)
}

/// Round-half-up of `numerator / denominator` for non-negative integers.
///
/// Returns `None` when the denominator is zero.
#[must_use]
pub const fn rounded_ratio(numerator: u64, denominator: u64) -> Option<u64> {
    if denominator == 0 {
        return None;
    }
    Some((2 * numerator + denominator) / (2 * denominator))
}

/// Percentile rank of `score` within `window`.
///
/// Counts the entries strictly below `score`; ties do not count. The result
/// is `round(100 × below / len)`. Returns `None` for an empty window.
///
/// # Examples
///
/// ```
/// use pulse_traits::stats::percentile_rank;
///
/// assert_eq!(percentile_rank(&[10, 20, 30, 40], 30), Some(50));
/// assert_eq!(percentile_rank(&[10, 20, 30, 40], 10), Some(0));
/// ```
#[must_use]
pub fn percentile_rank(window: &[Score], score: Score) -> Option<Score> {
    let below = window.iter().filter(|&&s| s < score).count() as u64;
    rounded_ratio(100 * below, window.len() as u64).map(|p| p.min(100) as Score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_mean_half_up() {
        // 1.5 rounds up
        assert_eq!(rounded_mean(&[1, 2]), Some(2));
        // 72.33 rounds down
        assert_eq!(rounded_mean(&[85, 60, 72]), Some(72));
        // 72.67 rounds up
        assert_eq!(rounded_mean(&[85, 61, 72]), Some(73));
    }

    #[test]
    fn test_rounded_mean_order_invariant() {
        let a = rounded_mean(&[85, 60, 70]);
        let b = rounded_mean(&[70, 85, 60]);
        let c = rounded_mean(&[60, 70, 85]);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, Some(72));
    }

    #[test]
    fn test_rounded_ratio() {
        assert_eq!(rounded_ratio(1, 2), Some(1));
        assert_eq!(rounded_ratio(1, 3), Some(0));
        assert_eq!(rounded_ratio(2, 3), Some(1));
        assert_eq!(rounded_ratio(5, 0), None);
    }

    #[test]
    fn test_percentile_rank_ties_excluded() {
        let window = [50; 30];
        assert_eq!(percentile_rank(&window, 50), Some(0));
        assert_eq!(percentile_rank(&window, 51), Some(100));
    }

    #[test]
    fn test_percentile_rank_empty() {
        assert_eq!(percentile_rank(&[], 50), None);
    }
}
