//! Persistent rolling score log.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pulse_cache::KvStore;
use pulse_traits::{Clock, PillarKey, Score, stats::percentile_rank};
use tracing::{debug, warn};

use crate::entry::ScoreEntry;

/// Key of the history log in the key-value store.
pub const HISTORY_KEY: &str = "score_history";

/// Most days kept.
pub const MAX_ENTRIES: usize = 60;

/// Days needed before a percentile can be computed, and the size of the
/// percentile window.
pub const PERCENTILE_WINDOW: usize = 30;

/// How far a save got in persisting the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The whole log was written.
    Full,
    /// Only the most recent [`PERCENTILE_WINDOW`] entries fit.
    Reduced,
    /// Nothing was persisted; the log lives in memory only.
    Skipped,
}

/// Rolling log of one composite per exchange-local day, newest first.
///
/// The log is loaded once on construction and written back on every save.
/// Storage failures never surface: a corrupt or unreadable log loads as
/// empty and a failed write degrades as described on
/// [`ScoreHistoryStore::save`].
#[derive(Debug)]
pub struct ScoreHistoryStore {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    entries: Mutex<Vec<ScoreEntry>>,
}

impl ScoreHistoryStore {
    /// Load the log from `store`.
    #[must_use]
    pub fn open(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        let entries = load(store.as_ref());
        debug!(days = entries.len(), "loaded score history");
        Self {
            store,
            clock,
            entries: Mutex::new(entries),
        }
    }

    /// Record today's scores, replacing any earlier save from the same day.
    ///
    /// The log is written in full; if that fails, the most recent
    /// [`PERCENTILE_WINDOW`] entries are written instead; if that also fails
    /// the write is skipped with a warning.
    pub fn save(&self, composite: Score, pillars: BTreeMap<PillarKey, Score>) -> WriteOutcome {
        let date = self.clock.market_date();
        let mut entries = self.lock();

        entries.retain(|e| e.date != date);
        entries.push(ScoreEntry::new(date, composite, pillars));
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries.truncate(MAX_ENTRIES);

        let outcome = self.persist(&entries);
        debug!(%date, composite, days = entries.len(), ?outcome, "saved score");
        outcome
    }

    /// Percentile rank of `score` against the last [`PERCENTILE_WINDOW`]
    /// saved composites, or `None` until that many days exist.
    #[must_use]
    pub fn percentile(&self, score: Score) -> Option<Score> {
        let entries = self.lock();
        if entries.len() < PERCENTILE_WINDOW {
            return None;
        }
        let window: Vec<Score> = entries
            .iter()
            .take(PERCENTILE_WINDOW)
            .map(|e| e.composite)
            .collect();
        percentile_rank(&window, score)
    }

    /// Number of stored days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All entries, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<ScoreEntry> {
        self.lock().clone()
    }

    /// Most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<ScoreEntry> {
        self.lock().first().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ScoreEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &[ScoreEntry]) -> WriteOutcome {
        match self.write(entries) {
            Ok(()) => return WriteOutcome::Full,
            Err(e) => warn!(error = %e, days = entries.len(), "full history write failed"),
        }

        let recent = &entries[..entries.len().min(PERCENTILE_WINDOW)];
        match self.write(recent) {
            Ok(()) => WriteOutcome::Reduced,
            Err(e) => {
                warn!(error = %e, "reduced history write failed, history not persisted");
                WriteOutcome::Skipped
            }
        }
    }

    fn write(&self, entries: &[ScoreEntry]) -> pulse_cache::Result<()> {
        let bytes = serde_json::to_vec(entries)?;
        self.store.put(HISTORY_KEY, &bytes)
    }
}

fn load(store: &dyn KvStore) -> Vec<ScoreEntry> {
    let bytes = match store.get(HISTORY_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "score history unreadable, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_slice::<Vec<ScoreEntry>>(&bytes) {
        Ok(mut entries) => {
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            entries.dedup_by_key(|e| e.date);
            entries.truncate(MAX_ENTRIES);
            entries
        }
        Err(e) => {
            warn!(error = %e, "score history corrupt, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use pulse_cache::{MemoryKvStore, RedbStore};
    use pulse_traits::ManualClock;
    use tempfile::TempDir;

    fn setup(store: Arc<dyn KvStore>) -> (Arc<ManualClock>, ScoreHistoryStore) {
        // noon in New York
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap(),
        ));
        let history = ScoreHistoryStore::open(store, clock.clone());
        (clock, history)
    }

    fn pillars(score: Score) -> BTreeMap<PillarKey, Score> {
        PillarKey::ALL.into_iter().map(|p| (p, score)).collect()
    }

    fn save_days(clock: &ManualClock, history: &ScoreHistoryStore, scores: impl IntoIterator<Item = Score>) {
        for score in scores {
            history.save(score, pillars(score));
            clock.advance(Duration::days(1));
        }
    }

    #[test]
    fn test_percentile_needs_thirty_days() {
        let (clock, history) = setup(Arc::new(MemoryKvStore::new()));
        save_days(&clock, &history, 40..69);
        assert_eq!(history.len(), 29);
        assert_eq!(history.percentile(55), None);

        save_days(&clock, &history, [69]);
        assert_eq!(history.len(), 30);
        // 40..=54 lie below 55: 15 of 30
        assert_eq!(history.percentile(55), Some(50));
        assert_eq!(history.percentile(0), Some(0));
        assert_eq!(history.percentile(100), Some(100));
    }

    #[test]
    fn test_percentile_is_monotone() {
        let (clock, history) = setup(Arc::new(MemoryKvStore::new()));
        save_days(&clock, &history, (0..45).map(|i| (i * 7 % 90 + 5) as Score));

        let ranks: Vec<Score> = (0..=100)
            .map(|s| history.percentile(s).unwrap())
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
        assert!(ranks.iter().all(|&r| r <= 100));
    }

    #[test]
    fn test_same_day_save_replaces() {
        let (_clock, history) = setup(Arc::new(MemoryKvStore::new()));
        history.save(50, pillars(50));
        history.save(64, pillars(64));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().composite, 64);
    }

    #[test]
    fn test_market_date_key() {
        let (clock, history) = setup(Arc::new(MemoryKvStore::new()));
        // 02:00 UTC on Jan 2 is still Jan 1 in New York
        clock.set(Utc.with_ymd_and_hms(2024, 1, 2, 2, 0, 0).unwrap());
        history.save(55, pillars(55));
        assert_eq!(
            history.latest().unwrap().date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_trims_to_sixty_newest_first() {
        let (clock, history) = setup(Arc::new(MemoryKvStore::new()));
        save_days(&clock, &history, (0..75).map(|i| i as Score));

        let entries = history.entries();
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(entries[0].composite, 74);
        assert_eq!(entries[59].composite, 15);
        assert!(entries.windows(2).all(|w| w[0].date > w[1].date));
    }

    #[test]
    fn test_reloads_from_store() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RedbStore::open(dir.path().join("pulse.redb")).unwrap());
        {
            let (clock, history) = setup(store.clone());
            save_days(&clock, &history, [50, 55, 60]);
        }
        let (_clock, history) = setup(store);
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest().unwrap().composite, 60);
    }

    #[test]
    fn test_corrupt_log_loads_empty_and_heals() {
        let store = Arc::new(MemoryKvStore::new());
        store.put(HISTORY_KEY, b"{not a list").unwrap();
        let (_clock, history) = setup(store.clone());
        assert!(history.is_empty());

        assert_eq!(history.save(58, pillars(58)), WriteOutcome::Full);
        let (_clock, reloaded) = setup(store);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_reduced_write_when_full_log_does_not_fit() {
        // one entry is about 130 bytes: thirty fit, sixty do not
        let store = Arc::new(MemoryKvStore::with_capacity(5_000));
        let (clock, history) = setup(store.clone());
        save_days(&clock, &history, (0..59).map(|i| (i % 80 + 10) as Score));

        assert_eq!(history.save(77, pillars(77)), WriteOutcome::Reduced);
        assert_eq!(history.len(), MAX_ENTRIES);

        let (_clock, reloaded) = setup(store);
        assert_eq!(reloaded.len(), PERCENTILE_WINDOW);
        assert_eq!(reloaded.latest().unwrap().composite, 77);
    }

    #[test]
    fn test_write_skipped_when_store_disabled() {
        let store = Arc::new(MemoryKvStore::new());
        let (_clock, history) = setup(store.clone());
        store.set_available(false);

        assert_eq!(history.save(50, pillars(50)), WriteOutcome::Skipped);
        // still served from memory
        assert_eq!(history.len(), 1);
    }
}
