//! Momentum factor over a configurable lookback and skip window.

use ronda_traits::{
    DateRange, Factor, FactorCategory, FactorDefinition, FactorFrame, HistoryAccess, PriceColumn,
    Result, RondaError, partition_prices,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::math::momentum_series;
use crate::partition::map_partitions;

/// Trading periods per calendar month.
pub const TRADING_DAYS_PER_MONTH: u32 = 21;

/// Unit in which lookback and skip are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodUnit {
    /// Calendar months converted with a fixed periods-per-month constant.
    Months {
        /// Trading periods per month.
        periods_per_month: u32,
    },
    /// Raw trading periods.
    Periods,
}

impl Default for PeriodUnit {
    fn default() -> Self {
        Self::Months {
            periods_per_month: TRADING_DAYS_PER_MONTH,
        }
    }
}

impl PeriodUnit {
    const fn suffix(&self) -> char {
        match self {
            Self::Months { .. } => 'm',
            Self::Periods => 'p',
        }
    }
}

/// Configuration for a momentum factor.
///
/// `lookback` and `skip` are signed so that invalid values coming from
/// configuration files are rejected with a descriptive error rather than
/// failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Length of the return window (must be positive).
    pub lookback: i64,

    /// Most recent periods excluded from the window (must be non-negative).
    pub skip: i64,

    /// Unit of `lookback` and `skip`.
    pub unit: PeriodUnit,

    /// Price field the returns are computed from.
    pub price_column: PriceColumn,

    /// Compute securities on the rayon pool.
    pub parallel: bool,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback: 12,
            skip: 1,
            unit: PeriodUnit::default(),
            price_column: PriceColumn::AdjClose,
            parallel: true,
        }
    }
}

impl MomentumConfig {
    /// Window measured in months of 21 trading periods.
    pub fn months(lookback: i64, skip: i64) -> Self {
        Self {
            lookback,
            skip,
            ..Self::default()
        }
    }

    /// Window measured in trading periods.
    pub fn periods(lookback: i64, skip: i64) -> Self {
        Self {
            lookback,
            skip,
            unit: PeriodUnit::Periods,
            ..Self::default()
        }
    }
}

/// Price momentum factor.
///
/// For each security the value at date `t` is the return from `t - skip -
/// lookback` to `t - skip`, counted in trading periods of that security's own
/// price history.
///
/// # Example
///
/// ```
/// use ronda_factors::momentum::{MomentumConfig, MomentumFactor};
/// use ronda_traits::Factor;
///
/// let factor = MomentumFactor::new(MomentumConfig::months(12, 1)).unwrap();
/// assert_eq!(factor.name(), "momentum_12m_skip_1m");
/// assert_eq!(factor.lookback(), 273);
/// ```
#[derive(Debug, Clone)]
pub struct MomentumFactor {
    config: MomentumConfig,
    name: String,
    lookback_periods: usize,
    skip_periods: usize,
}

impl MomentumFactor {
    /// Create a momentum factor, validating the window.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] naming `lookback`, `skip` or
    /// `periods_per_month` when that value is out of range.
    pub fn new(config: MomentumConfig) -> Result<Self> {
        if config.lookback <= 0 {
            return Err(RondaError::invalid_parameter(
                "lookback",
                format!("must be positive, got {}", config.lookback),
            ));
        }
        if config.skip < 0 {
            return Err(RondaError::invalid_parameter(
                "skip",
                format!("must be non-negative, got {}", config.skip),
            ));
        }
        let per_unit = match config.unit {
            PeriodUnit::Months { periods_per_month } if periods_per_month == 0 => {
                return Err(RondaError::invalid_parameter(
                    "periods_per_month",
                    "must be positive",
                ));
            }
            PeriodUnit::Months { periods_per_month } => periods_per_month as usize,
            PeriodUnit::Periods => 1,
        };

        let to_periods = |value: i64, param: &str| {
            usize::try_from(value)
                .ok()
                .and_then(|v| v.checked_mul(per_unit))
                .ok_or_else(|| RondaError::invalid_parameter(param, "window is too large"))
        };
        let lookback_periods = to_periods(config.lookback, "lookback")?;
        let skip_periods = to_periods(config.skip, "skip")?;

        let suffix = config.unit.suffix();
        let name = format!(
            "momentum_{}{suffix}_skip_{}{suffix}",
            config.lookback, config.skip
        );

        Ok(Self {
            config,
            name,
            lookback_periods,
            skip_periods,
        })
    }

    /// The validated configuration.
    pub const fn config(&self) -> &MomentumConfig {
        &self.config
    }

    /// Lookback window in trading periods.
    pub const fn lookback_periods(&self) -> usize {
        self.lookback_periods
    }

    /// Skip window in trading periods.
    pub const fn skip_periods(&self) -> usize {
        self.skip_periods
    }
}

impl Factor for MomentumFactor {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> FactorDefinition {
        let (lookback_key, skip_key, unit_label) = match self.config.unit {
            PeriodUnit::Months { .. } => ("lookback_months", "skip_months", "months"),
            PeriodUnit::Periods => ("lookback_periods", "skip_periods", "periods"),
        };
        FactorDefinition::new(&self.name, FactorCategory::Momentum)
            .with_parameter(lookback_key, self.config.lookback)
            .with_parameter(skip_key, self.config.skip)
            .with_description(format!(
                "Price momentum over {} {unit_label} skipping most recent {} {unit_label}.",
                self.config.lookback, self.config.skip
            ))
            .with_formula("momentum = P[t-skip] / P[t-skip-lookback] - 1")
            .with_source("prices")
            .with_tags(&["momentum", "price"])
    }

    fn compute(&self, history: &dyn HistoryAccess) -> Result<FactorFrame> {
        let rows = history.prices(self.config.price_column, &DateRange::all())?;
        let series = partition_prices(&rows)?;
        debug!(
            factor = %self.name,
            securities = series.len(),
            "computing momentum"
        );

        let per_security = map_partitions(&series, self.config.parallel, |s| {
            momentum_series(s.prices(), self.lookback_periods, self.skip_periods)
        });

        let mut frame = FactorFrame::new(&self.name);
        for (s, values) in series.iter().zip(&per_security) {
            frame.extend_series(s.security_id(), s.dates(), values);
        }

        if frame.is_empty() {
            return Err(RondaError::InsufficientData(format!(
                "{}: no security has more than {} price observations",
                self.name,
                self.lookback()
            )));
        }
        Ok(frame)
    }

    fn lookback(&self) -> usize {
        self.lookback_periods + self.skip_periods
    }
}
