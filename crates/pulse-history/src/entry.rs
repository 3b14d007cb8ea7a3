//! One day of score history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pulse_traits::{PillarKey, Score};
use serde::{Deserialize, Serialize};

/// Composite and pillar scores recorded for one exchange-local day.
///
/// Serialized with the date as an ISO `YYYY-MM-DD` string. Unknown fields are
/// ignored on read so the format can grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Exchange-local calendar day.
    pub date: NaiveDate,
    /// Composite score.
    pub composite: Score,
    /// Pillar scores.
    #[serde(default)]
    pub pillars: BTreeMap<PillarKey, Score>,
}

impl ScoreEntry {
    /// Create an entry.
    #[must_use]
    pub const fn new(date: NaiveDate, composite: Score, pillars: BTreeMap<PillarKey, Score>) -> Self {
        Self {
            date,
            composite,
            pillars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_serializes_as_iso_string() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let entry = ScoreEntry::new(date, 61, BTreeMap::from([(PillarKey::Credit, 60)]));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2024-03-05");
        assert_eq!(json["pillars"]["credit"], 60);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{"date":"2024-03-05","composite":48,"note":"added later"}"#;
        let entry: ScoreEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.composite, 48);
        assert!(entry.pillars.is_empty());
    }
}
