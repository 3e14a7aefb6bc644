//! ronda CLI binary.
//!
//! Drives the factor pipeline against a SQLite warehouse: loading history,
//! computing and storing factors, and exporting target weights.

mod cmd;
mod config;
mod logging;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ronda::traits::Date;

use crate::cmd::weights::WeightsArgs;
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Factor computation and target-weight construction", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, global = true, default_value = "ronda.toml")]
    config: PathBuf,

    /// Database file (overrides the config file and environment)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the warehouse tables
    InitDb,

    /// Load prices, fundamentals and securities from CSV files
    Import {
        /// Prices CSV: security_id, trade_date and price columns
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Fundamentals CSV: security_id, period_end, metric, value
        #[arg(long)]
        fundamentals: Option<PathBuf>,

        /// Securities CSV: security_id, ticker, sector
        #[arg(long)]
        securities: Option<PathBuf>,
    },

    /// List catalog and registered factors
    Factors {
        /// Filter by category (momentum, value)
        #[arg(short, long)]
        category: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compute named factors
    Compute {
        /// Factor names
        #[arg(required = true)]
        names: Vec<String>,

        /// Register and store the values
        #[arg(long)]
        persist: bool,

        /// Run id stored with the values
        #[arg(long)]
        run_id: Option<String>,

        /// First output date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<Date>,

        /// Last output date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<Date>,

        /// Also write each factor's normalized values to <DIR>/<factor>.csv
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Run the configured factor set
    Pipeline {
        /// Run id stored with the values
        #[arg(long)]
        run_id: Option<String>,

        /// First output date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<Date>,

        /// Last output date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<Date>,

        /// Also write each factor's normalized values to <DIR>/<factor>.csv
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Build target weights from stored scores
    Weights(WeightsArgs),
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_json);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(&cli.config)?;
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }
    config.validate()?;

    match cli.command {
        Commands::InitDb => cmd::init_db::run(&config)?,
        Commands::Import {
            prices,
            fundamentals,
            securities,
        } => cmd::import::run(
            &config,
            prices.as_deref(),
            fundamentals.as_deref(),
            securities.as_deref(),
        )?,
        Commands::Factors { category, verbose } => {
            cmd::factors::run(&config, category.as_deref(), verbose)?;
        }
        Commands::Compute {
            names,
            persist,
            run_id,
            start,
            end,
            output_dir,
        } => {
            config.pipeline.factors = names;
            config.pipeline.persist = persist;
            cmd::compute::run(&config, run_id, start, end, output_dir.as_deref())?;
        }
        Commands::Pipeline {
            run_id,
            start,
            end,
            output_dir,
        } => {
            cmd::compute::run(&config, run_id, start, end, output_dir.as_deref())?;
        }
        Commands::Weights(args) => cmd::weights::run(&config, &args)?,
    }

    Ok(())
}
