//! CLI subcommand modules.
//!
//! This module contains the implementations for all pulse CLI subcommands.

pub(crate) mod history;
pub(crate) mod lite;
pub(crate) mod refresh;
pub(crate) mod score;
pub(crate) mod signals;

use anyhow::{Context, Result};
use pulse::traits::{RawSignalValue, RawValue};
use pulse::{CompositeReport, SignalKey, Snapshot};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Print a boxed section title.
pub(crate) fn banner(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║ {title:^60} ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

/// Read a snapshot file: a JSON object of signal key to number or boolean.
pub(crate) fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let values: BTreeMap<SignalKey, RawValue> = serde_json::from_str(&text)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok(values
        .into_iter()
        .map(|(key, value)| RawSignalValue::new(key, value))
        .collect())
}

/// Print a report as a table or as JSON.
pub(crate) fn print_report(report: &CompositeReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Composite:  {} ({})", report.score, report.status);
    println!(
        "Agreement:  {} ({} bullish, {} neutral, {} bearish)",
        report.agreement.verdict.label(),
        report.agreement.bullish,
        report.agreement.neutral,
        report.agreement.bearish
    );
    if report.incomplete {
        println!(
            "Warning:    {} signals missing, score is incomplete",
            report.missing.len()
        );
    }
    println!();

    for pillar in report.pillars.values() {
        println!(
            "{:12} {:>3}  (weight {:.0}%)",
            pillar.key.to_string(),
            pillar.score,
            pillar.weight * 100.0
        );
        println!("{}", "-".repeat(60));
        for s in &pillar.signals {
            let marker = if s.is_fallback { " *" } else { "" };
            println!(
                "  {:28} {:>10} {:>4}{}",
                s.name, s.display_value, s.score, marker
            );
        }
        println!();
    }

    if !report.missing.is_empty() {
        println!("* fallback value used\n");
    }
    Ok(())
}

/// Print any serializable value as pretty JSON.
pub(crate) fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON `null` for absent values.
pub(crate) fn or_null<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, Into::into)
}
