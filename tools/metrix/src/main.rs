//! Metrix - time series function runner
//!
//! Loads a metric series from CSV, runs a query of function references
//! against it and prints the mutated series together with every function's
//! outputs.

mod config;
mod input;
mod output;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use metrix_functions::FunctionEngine;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "metrix")]
#[command(about = "Metrix - time series function runner")]
#[command(long_about = "Metrix - time series function runner

Commands:
  run         Run a query against a CSV series
  list        List the function catalog
  describe    Show one catalog entry

Examples:
  metrix run -i cpu.csv -q \"savgint(60000); avg; trend\"
  metrix run -i a.csv -p b.csv -q \"fastdtw(metric:b,1,0.5)\" --format table
  metrix describe savgbckt")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (toml, yaml or json)
    #[arg(short = 'c', long = "config", global = true, env = "METRIX_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query against a CSV series
    Run {
        /// CSV file with `timestamp,value` columns
        #[arg(short, long)]
        input: PathBuf,

        /// Semicolon separated function references
        #[arg(short, long)]
        query: String,

        /// Partner series for pair analyses
        #[arg(short, long)]
        partner: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// List the function catalog
    List,

    /// Show one catalog entry
    Describe {
        /// Function query name, e.g. savgint
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut app_config = AppConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        app_config.logging.level = "debug".to_string();
    }
    let _log_guard = common::init_logging(&app_config.logging)?;
    debug!(config = ?app_config, "Configuration loaded");

    let engine = FunctionEngine::new(app_config.engine);

    match cli.command {
        Commands::Run {
            input,
            query,
            partner,
            format,
        } => {
            let mut series = input::load_series(&input)?;
            let partner = partner.as_deref().map(input::load_series).transpose()?;

            let outcome = engine.run_with_partner(&query, &mut series, partner.as_ref())?;
            info!(
                series = series.name(),
                points = series.len(),
                functions = outcome.values.len(),
                rejected = outcome.rejected.len(),
                transformations = ?output::applied_transformations(&outcome.values),
                "Query finished"
            );

            println!("{}", output::render_run(format, &series, &outcome)?);
        },
        Commands::List => {
            print!("{}", output::render_catalog(engine.registry().specs()));
        },
        Commands::Describe { name } => {
            let spec = engine
                .registry()
                .describe(&name)
                .ok_or_else(|| anyhow!("Unknown function: {}", name))?;
            print!("{}", output::render_spec(spec));
        },
    }

    Ok(())
}
