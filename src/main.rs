//! athlete-attribution - command-line front end for the attribution engine
//!
//! Reads an athlete dataset (JSON), runs every candidate pair through the
//! engine and prints the resulting InsightSet as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Analyze with the built-in running catalog and default thresholds
//! athlete-attribution analyze --series athlete.json --pretty
//!
//! # Pipe a synthetic athlete straight in
//! athlete-simulation --days 180 --seed 7 > athlete.json
//! athlete-attribution analyze --series athlete.json --lookback-days 120
//!
//! # Dump editable defaults
//! athlete-attribution config > attribution.toml
//! athlete-attribution catalog > catalog.toml
//! ```
//!
//! # Environment Variables
//!
//! - `ATTRIBUTION_CONFIG`: Path to the engine config TOML (overridden by `--config`)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;

use athlete_attribution::{
    AthleteData, CandidateCatalog, CorrelationEngine, EngineConfig, LookbackWindow,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "athlete-attribution")]
#[command(about = "N=1 leading-indicator analysis for endurance athletes")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Analyze one athlete dataset and print the InsightSet
    Analyze {
        /// Athlete dataset (JSON: athlete_id + series)
        #[arg(long, value_name = "FILE")]
        series: PathBuf,

        /// Candidate catalog TOML (default: built-in running catalog)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Engine config TOML (default: $ATTRIBUTION_CONFIG, ./attribution.toml, built-ins)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Days of history to analyze
        #[arg(long, default_value = "180", value_parser = clap::value_parser!(u32).range(1..=3650))]
        lookback_days: u32,

        /// Last day of the window (default: latest date in the data)
        #[arg(long, value_name = "YYYY-MM-DD")]
        end: Option<NaiveDate>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the built-in candidate catalog as TOML
    Catalog,

    /// Print the default engine configuration as TOML
    Config,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    match args.command {
        SubCommand::Analyze {
            series,
            catalog,
            config,
            lookback_days,
            end,
            pretty,
        } => run_analyze(&series, catalog.as_deref(), config.as_deref(), lookback_days, end, pretty),
        SubCommand::Catalog => {
            print!("{}", CandidateCatalog::default_running().to_toml()?);
            Ok(())
        }
        SubCommand::Config => {
            print!("{}", EngineConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_analyze(
    series: &Path,
    catalog: Option<&Path>,
    config: Option<&Path>,
    lookback_days: u32,
    end: Option<NaiveDate>,
    pretty: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::load(),
    };

    let catalog = match catalog {
        Some(path) => CandidateCatalog::load_from_file(path)
            .with_context(|| format!("loading candidate catalog {}", path.display()))?,
        None => CandidateCatalog::default_running(),
    };

    let raw = std::fs::read_to_string(series)
        .with_context(|| format!("reading athlete dataset {}", series.display()))?;
    let data: AthleteData = serde_json::from_str(&raw)
        .with_context(|| format!("parsing athlete dataset {}", series.display()))?;

    info!(
        athlete = data.athlete_id(),
        signals = data.signals().count(),
        candidates = catalog.len(),
        lookback_days,
        "Starting attribution analysis"
    );

    let engine = CorrelationEngine::new(config).context("building engine")?;
    let window = LookbackWindow { days: lookback_days, end };
    let insights = engine
        .analyze_catalog(&data, &catalog, window)
        .context("analysis failed")?;

    let json = if pretty {
        serde_json::to_string_pretty(&insights)?
    } else {
        serde_json::to_string(&insights)?
    };
    println!("{json}");
    Ok(())
}
