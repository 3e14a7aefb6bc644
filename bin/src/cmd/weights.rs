//! `weights` command: stored scores to a target-weight CSV.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use ronda::traits::{Date, DateRange, HistoryAccess, PriceColumn};
use ronda::weights::{
    RankDirection, RebalanceFrequency, ScoreColumn, SelectionSize, Strategy, WeightBuilder,
    WeightConfig, WeightingScheme,
};
use ronda::load_score_panel;

use crate::cmd::open_database;
use crate::config::AppConfig;

/// Selection rule chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StrategyKind {
    /// Best N long
    TopN,
    /// Best N long, worst N short
    LongShort,
    /// Above --upper long, below --lower short
    Threshold,
}

#[derive(Debug, Args)]
pub(crate) struct WeightsArgs {
    /// Registered factor name
    #[arg(long)]
    factor: String,

    /// Stored column to rank (raw, market_zscore, market_rank, sector_zscore, sector_rank)
    #[arg(long, default_value = "market_zscore")]
    column: ScoreColumn,

    /// Selection rule (defaults to the [weights] config)
    #[arg(long, value_enum)]
    strategy: Option<StrategyKind>,

    /// Names per side
    #[arg(long, conflicts_with = "fraction")]
    top_n: Option<usize>,

    /// Fraction of candidates per side, e.g. 0.1 for the top 10%
    #[arg(long)]
    fraction: Option<f64>,

    /// Long threshold
    #[arg(long, allow_hyphen_values = true)]
    upper: Option<f64>,

    /// Short threshold
    #[arg(long, allow_hyphen_values = true)]
    lower: Option<f64>,

    /// Weighting of selected names (equal, score)
    #[arg(long)]
    weighting: Option<WeightingScheme>,

    /// Rebalance frequency (daily/D, weekly/W, monthly/M, quarterly/Q)
    #[arg(long)]
    frequency: Option<RebalanceFrequency>,

    /// The column is a rank where 1 is best
    #[arg(long)]
    lower_is_better: bool,

    /// First date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<Date>,

    /// Last date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<Date>,

    /// Price column for the price matrix
    #[arg(long, default_value = "adj_close")]
    price_column: PriceColumn,

    /// Weights CSV
    #[arg(long)]
    output: PathBuf,

    /// Aligned prices CSV
    #[arg(long)]
    prices_output: Option<PathBuf>,
}

impl WeightsArgs {
    fn size(&self, base: Strategy) -> SelectionSize {
        match (self.top_n, self.fraction, base) {
            (Some(n), _, _) => SelectionSize::Count(n),
            (None, Some(f), _) => SelectionSize::Fraction(f),
            (None, None, Strategy::TopN { size } | Strategy::LongShort { size }) => size,
            (None, None, Strategy::Threshold { .. }) => SelectionSize::default(),
        }
    }

    fn strategy(&self, base: Strategy) -> Result<Strategy> {
        let kind = match self.strategy {
            Some(kind) => kind,
            None => match base {
                Strategy::TopN { .. } => StrategyKind::TopN,
                Strategy::LongShort { .. } => StrategyKind::LongShort,
                Strategy::Threshold { .. } => StrategyKind::Threshold,
            },
        };
        Ok(match kind {
            StrategyKind::TopN => Strategy::TopN {
                size: self.size(base),
            },
            StrategyKind::LongShort => Strategy::LongShort {
                size: self.size(base),
            },
            StrategyKind::Threshold => {
                let (base_upper, base_lower) = match base {
                    Strategy::Threshold { upper, lower } => (Some(upper), Some(lower)),
                    _ => (None, None),
                };
                match (self.upper.or(base_upper), self.lower.or(base_lower)) {
                    (Some(upper), Some(lower)) => Strategy::Threshold { upper, lower },
                    _ => bail!("threshold strategy needs --upper and --lower"),
                }
            }
        })
    }

    /// The [weights] config with command-line overrides applied.
    pub(crate) fn weight_config(&self, base: &WeightConfig) -> Result<WeightConfig> {
        let config = WeightConfig {
            strategy: self.strategy(base.strategy)?,
            weighting: self.weighting.unwrap_or(base.weighting),
            direction: if self.lower_is_better {
                RankDirection::LowerIsBetter
            } else {
                base.direction
            },
            frequency: self.frequency.unwrap_or(base.frequency),
            ..*base
        };
        config.validate()?;
        Ok(config)
    }
}

/// Build weights for one stored factor and write them out.
pub(crate) fn run(config: &AppConfig, args: &WeightsArgs) -> Result<()> {
    let weight_config = args.weight_config(&config.weights)?;
    let builder = WeightBuilder::new(weight_config)?;
    let range = DateRange::new(args.start, args.end)?;

    let db = open_database(config)?;
    let store = db.factor_store();
    let history = db.history();

    let panel = load_score_panel(&store, &args.factor, args.column, &range)
        .with_context(|| format!("loading {} scores for {}", args.column, args.factor))?;
    let prices = history.prices(args.price_column, &range)?;
    let input = builder.build_simulation(&panel, &prices)?;

    input.weights.write_csv(&args.output)?;
    println!(
        "Wrote {} dates x {} securities ({} {}, {}) to {}",
        input.weights.dates().len(),
        input.weights.securities().len(),
        weight_config.strategy.name(),
        weight_config.weighting,
        weight_config.frequency,
        args.output.display()
    );
    if let Some(path) = &args.prices_output {
        input.prices.write_csv(path)?;
        println!("Wrote aligned prices to {}", path.display());
    }
    Ok(())
}
