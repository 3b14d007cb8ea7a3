//! Refresh command implementation.

use anyhow::{Result, bail};
use pulse::fetch::{HttpSource, SignalSource, StaticSource};
use pulse::{MarketPulse, PulseConfig};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::{banner, load_snapshot, or_null, print_json, print_report};

/// Run one refresh cycle and record the result.
pub(crate) async fn refresh(snapshot: Option<&Path>, json: bool) -> Result<()> {
    let config = PulseConfig::from_env()?;
    debug!(?config, "loaded configuration");

    let source: Arc<dyn SignalSource> = match (snapshot, &config.base_url) {
        (Some(path), _) => Arc::new(StaticSource::new("snapshot", load_snapshot(path)?)),
        (None, Some(url)) => Arc::new(HttpSource::from_env("http", url.clone())?),
        (None, None) => bail!("no source: pass --snapshot or set PULSE_BASE_URL"),
    };

    let pulse = MarketPulse::builder()
        .config(config)
        .source(source)
        .build()?;
    let outcome = pulse.refresh().await?;
    let percentile = pulse.history_percentile(outcome.report.score);

    if json {
        return print_json(&json!({
            "cycle": outcome.cycle,
            "report": outcome.report,
            "failures": outcome.failures,
            "percentile": or_null(percentile),
            "history_days": pulse.history_length(),
        }));
    }

    banner("Market Health Refresh");
    print_report(&outcome.report, false)?;

    if !outcome.failures.is_empty() {
        println!("Fetch failures:");
        for (key, failure) in &outcome.failures {
            let kind = failure.kind.map_or("TASK", |k| k.as_str());
            println!("  {:28} {:12} {}", key.as_str(), kind, failure.message);
        }
        println!();
    }

    match percentile {
        Some(p) => println!("30-day percentile: {p}"),
        None => println!(
            "30-day percentile: not yet available ({} days stored)",
            pulse.history_length()
        ),
    }
    println!();
    Ok(())
}
