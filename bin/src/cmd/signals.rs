//! Signal listing command implementation.

use anyhow::{Result, anyhow};
use pulse::PillarKey;
use pulse::signals::{SignalInfo, available_signals, signals_by_pillar};

use super::{banner, print_json};

/// List the scored signals, optionally for one pillar.
pub(crate) fn list_signals(pillar: Option<&str>, verbose: bool, json: bool) -> Result<()> {
    let signals: Vec<SignalInfo> = match pillar {
        Some(name) => {
            let key: PillarKey = name
                .parse()
                .map_err(|_| anyhow!("unknown pillar {name:?}"))?;
            signals_by_pillar(key)
        }
        None => available_signals(),
    };

    if json {
        return print_json(&signals);
    }

    banner("Market Signals");

    for key in PillarKey::ALL {
        let group: Vec<&SignalInfo> = signals.iter().filter(|s| s.pillar == key).collect();
        if group.is_empty() {
            continue;
        }

        println!("{key}:");
        println!("{}", "-".repeat(60));
        for info in group {
            if verbose {
                println!(
                    "  {:28} {:8} [{}, {}]  {}",
                    info.key.as_str(),
                    info.ticker,
                    info.range.0,
                    info.range.1,
                    info.threshold
                );
            } else {
                println!("  {:28} {}", info.key.as_str(), info.name);
            }
        }
        println!();
    }

    if !verbose {
        println!("Use --verbose for score bands.\n");
    }

    Ok(())
}
