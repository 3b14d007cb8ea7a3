//! History command implementation.

use anyhow::Result;
use pulse::history::PERCENTILE_WINDOW;
use pulse::{MarketPulse, PulseConfig};
use serde_json::json;

use super::{banner, or_null, print_json};

/// Print the stored history and optionally rank a score against it.
pub(crate) fn show_history(score: Option<u8>, json: bool) -> Result<()> {
    let pulse = MarketPulse::builder()
        .config(PulseConfig::from_env()?)
        .build()?;
    let entries = pulse.history().entries();
    let percentile = score.and_then(|s| pulse.history_percentile(s));

    if json {
        return print_json(&json!({
            "entries": entries,
            "score": or_null(score),
            "percentile": or_null(percentile),
        }));
    }

    banner("Score History");

    if entries.is_empty() {
        println!("No scores recorded yet. Run `pulse refresh` first.\n");
    }
    for entry in &entries {
        println!("  {}  {:>3}", entry.date, entry.composite);
    }
    println!();

    if let Some(s) = score {
        match percentile {
            Some(p) => println!("Score {s} ranks at the {p} percentile of the last {PERCENTILE_WINDOW} days."),
            None => println!(
                "Percentile needs {PERCENTILE_WINDOW} days of history, {} stored.",
                entries.len()
            ),
        }
        println!();
    }
    Ok(())
}
