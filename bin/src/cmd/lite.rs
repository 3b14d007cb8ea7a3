//! Lite index command implementation.

use anyhow::Result;
use pulse::{LiteIndex, LiteQuotes};

use super::{banner, print_json};

/// Compute and print the lite index.
pub(crate) fn show_lite(quotes: &LiteQuotes, json: bool) -> Result<()> {
    let index = LiteIndex::compute(quotes);
    if json {
        return print_json(&index);
    }

    banner("Lite Index");
    println!("Score:          {}", index.score);
    println!("Direction:      {}", index.direction);
    println!("Risk appetite:  {}", index.risk_appetite);
    println!("Volatility:     {}", index.volatility);
    if index.degraded {
        println!("\nMissing quotes, showing the neutral default.");
    }
    println!();
    Ok(())
}
