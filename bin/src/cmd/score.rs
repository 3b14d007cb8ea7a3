//! Score command implementation.

use anyhow::Result;
use pulse::combine::{PillarWeights, ScoringEngine};
use std::path::Path;

use super::{banner, load_snapshot, print_report};

/// Score a snapshot file offline.
pub(crate) fn score_snapshot(path: &Path, json: bool) -> Result<()> {
    let snapshot = load_snapshot(path)?;
    let engine = ScoringEngine::new(PillarWeights::default())?;
    let report = engine.evaluate(&snapshot)?;

    if !json {
        banner("Market Health Score");
        println!("Snapshot:   {} ({} signals)", path.display(), snapshot.len());
    }
    print_report(&report, json)
}
