//! Pulse CLI binary.
//!
//! Provides command-line interface for the Pulse market health score.

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Composite market health score", long_about = None)]
#[command(version)]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scored signals
    Signals {
        /// Filter by pillar (direction, breadth, volatility, credit, sentiment, global)
        #[arg(short, long)]
        pillar: Option<String>,

        /// Show score bands and ranges
        #[arg(short, long)]
        verbose: bool,
    },

    /// Score a snapshot file without fetching anything
    Score {
        /// JSON object mapping signal keys to numbers or booleans
        #[arg(short, long)]
        snapshot: PathBuf,
    },

    /// Fetch every signal, score it and record today's composite
    Refresh {
        /// Serve signals from a snapshot file instead of `PULSE_BASE_URL`
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Show the stored score history
    History {
        /// Rank this score against the last 30 days
        #[arg(short, long)]
        score: Option<u8>,
    },

    /// Compute the lite index from four quotes
    Lite {
        /// SPY 20-day return in percent
        #[arg(long, allow_hyphen_values = true)]
        spy: Option<f64>,

        /// HYG 20-day return in percent
        #[arg(long, allow_hyphen_values = true)]
        hyg: Option<f64>,

        /// LQD 20-day return in percent
        #[arg(long, allow_hyphen_values = true)]
        lqd: Option<f64>,

        /// VIX level
        #[arg(long)]
        vix: Option<f64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Commands::Signals { pillar, verbose } => {
            cmd::signals::list_signals(pillar.as_deref(), verbose, json)?;
        }
        Commands::Score { snapshot } => {
            cmd::score::score_snapshot(&snapshot, json)?;
        }
        Commands::Refresh { snapshot } => {
            cmd::refresh::refresh(snapshot.as_deref(), json).await?;
        }
        Commands::History { score } => {
            cmd::history::show_history(score, json)?;
        }
        Commands::Lite { spy, hyg, lqd, vix } => {
            let quotes = pulse::LiteQuotes {
                spy_return_pct: spy,
                hyg_return_pct: hyg,
                lqd_return_pct: lqd,
                vix,
            };
            cmd::lite::show_lite(&quotes, json)?;
        }
    }

    Ok(())
}
