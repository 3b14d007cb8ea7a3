//! Rolling composite score history for Pulse.
//!
//! [`ScoreHistoryStore`] keeps one [`ScoreEntry`] per exchange-local
//! calendar day, newest first and capped at [`MAX_ENTRIES`] days, persisted
//! as a single JSON document in a [`pulse_cache::KvStore`]. Once
//! [`PERCENTILE_WINDOW`] days exist it ranks a score against the most recent
//! window.

mod entry;
mod store;

pub use entry::ScoreEntry;
pub use store::{HISTORY_KEY, MAX_ENTRIES, PERCENTILE_WINDOW, ScoreHistoryStore, WriteOutcome};
