//! dca - Arps decline curve analysis from the command line
//!
//! # Usage
//!
//! ```bash
//! # Fit every stream in a production CSV and forecast 30 years
//! dca fit --csv well_a.csv
//!
//! # Hyperbolic oil fit, 10 years, stop at 5 bbl/d, JSON output
//! dca fit --csv well_a.csv --stream oil --model hyperbolic --days 3650 --economic-limit 5 --json
//!
//! # Unit conversion
//! dca convert 10 M FT
//!
//! # Print effective configuration
//! dca config
//! ```
//!
//! # Environment Variables
//!
//! - `DCA_CONFIG`: Path to engine config TOML (default: ./dca_config.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use dca_engine::analysis::analyze_well;
use dca_engine::config::{self, EngineConfig};
use dca_engine::import::{import_csv, ImportOptions};
use dca_engine::scenario::{InMemoryScenarioStore, ScenarioStore};
use dca_engine::types::{FitMode, ForecastSettings, Stream};
use dca_engine::units;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "dca")]
#[command(about = "Arps decline curve analysis and production forecasting")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Fit decline curves to a production CSV and forecast each stream
    Fit {
        /// Production CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Only analyse this stream (oil, gas, water)
        #[arg(long)]
        stream: Option<Stream>,

        /// Model family: auto, exponential, harmonic, hyperbolic
        #[arg(long, default_value = "auto")]
        model: FitMode,

        /// Forecast duration cap in days (default from config)
        #[arg(long)]
        days: Option<u32>,

        /// Economic limit rate, 0 disables (default from config)
        #[arg(long)]
        economic_limit: Option<f64>,

        /// Well to select when the file holds several
        #[arg(long)]
        well: Option<String>,

        /// Save the results as scenarios under this name
        #[arg(long, requires = "store")]
        scenario: Option<String>,

        /// Scenario store file (JSON), created if missing
        #[arg(long)]
        store: Option<PathBuf>,

        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Convert a value between units, e.g. `dca convert 10 M FT`
    Convert {
        value: f64,
        from: String,
        to: String,
    },

    /// Print the effective engine configuration as TOML
    Config,
}

// ============================================================================
// Commands
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn run_fit(
    csv: PathBuf,
    stream: Option<Stream>,
    model: FitMode,
    days: Option<u32>,
    economic_limit: Option<f64>,
    well: Option<String>,
    scenario: Option<String>,
    store_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let options = ImportOptions {
        well_id: well,
        ..ImportOptions::from_global()
    };
    let import = import_csv(&csv, &options)
        .with_context(|| format!("Failed to import {}", csv.display()))?;

    let mut streams = import.streams();
    if let Some(only) = stream {
        streams.retain(|(s, _)| *s == only);
        if streams.is_empty() {
            return Err(anyhow::anyhow!(
                "No {} data in {}",
                only,
                csv.display()
            ));
        }
    }

    let defaults = ForecastSettings::default();
    let settings = ForecastSettings {
        days: days.unwrap_or(defaults.days),
        economic_limit: economic_limit.unwrap_or(defaults.economic_limit),
        ..defaults
    };

    let analysis = analyze_well(&import.info.well_id, &streams, model, &settings);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&analysis).context("Failed to serialise results")?
        );
    } else {
        println!(
            "Well {} | {} days | economic limit {}",
            analysis.well_id, settings.days, settings.economic_limit
        );
        println!(
            "{:<6} {:<11} {:>10} {:>10} {:>6} {:>8} {:>12} {:>10}",
            "stream", "model", "qi", "Di (1/d)", "b", "R²", "EUR", "t_limit"
        );
        for s in &analysis.streams {
            let fit = &s.outcome.fit;
            println!(
                "{:<6} {:<11} {:>10.2} {:>10.6} {:>6.3} {:>8.4} {:>12.1} {:>10.1}",
                s.stream,
                fit.model_type,
                fit.qi,
                fit.di,
                fit.b,
                fit.r_squared,
                s.forecast.eur,
                s.forecast.time_to_limit
            );
        }
        for f in &analysis.failures {
            println!("{:<6} FAILED: {}", f.stream, f.reason);
        }
    }

    if let (Some(name), Some(path)) = (scenario, store_path) {
        let store = InMemoryScenarioStore::load_or_new(&path);
        for s in analysis.into_scenarios(&name)? {
            let key = s.key();
            if store.get_scenario(&key)?.is_some() {
                store.replace_scenario(s)?;
            } else {
                store.add_scenario(s)?;
            }
        }
        store
            .save_to_file(&path)
            .with_context(|| format!("Failed to save scenarios to {}", path.display()))?;
        info!(scenario = %name, path = %path.display(), "Scenarios saved");
    }

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    config::init(EngineConfig::load());

    match args.command {
        SubCommand::Fit {
            csv,
            stream,
            model,
            days,
            economic_limit,
            well,
            scenario,
            store,
            json,
        } => run_fit(
            csv,
            stream,
            model,
            days,
            economic_limit,
            well,
            scenario,
            store,
            json,
        ),
        SubCommand::Convert { value, from, to } => {
            println!("{}", units::convert(value, &from, &to));
            Ok(())
        }
        SubCommand::Config => {
            let toml = config::get()
                .to_toml()
                .context("Failed to serialise configuration")?;
            print!("{toml}");
            Ok(())
        }
    }
}
