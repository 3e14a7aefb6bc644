//! End-to-end factor runs: compute, normalize, persist.
//!
//! Per-security factor math runs first (in parallel inside each factor),
//! then every date's cross-section is normalized once all securities are in,
//! then the definition is registered and the values upserted under a single
//! [`CalcRunId`].

use std::fmt;

use ronda_factors::FactorOptions;
use ronda_normalize::{CrossSectionalNormalizer, NormalizeConfig};
use ronda_traits::{
    CalcRunId, Date, DateRange, Factor, FactorDefinition, FactorFrame, FactorId, FactorStore,
    HistoryAccess, Result, RondaError, ScoredValue, SectorMap, SectorReference, UpsertSummary,
};
use ronda_weights::{ScoreColumn, ScorePanel};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Configuration of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Factor names to run; empty runs the default factor set.
    pub factors: Vec<String>,
    /// Options applied to every built factor.
    pub options: FactorOptions,
    /// First output date.
    pub start: Option<Date>,
    /// Last output date.
    pub end: Option<Date>,
    /// Register definitions and upsert values.
    pub persist: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            factors: Vec::new(),
            options: FactorOptions::default(),
            start: None,
            end: None,
            persist: true,
        }
    }
}

impl PipelineConfig {
    /// Output date range.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] when `start` is after `end`.
    pub fn range(&self) -> Result<DateRange> {
        DateRange::new(self.start, self.end)
    }

    /// Build the configured factors, or the default set when none are named.
    pub fn build_factors(&self) -> Result<Vec<Box<dyn Factor>>> {
        if self.factors.is_empty() {
            ronda_factors::default_factor_set(&self.options)
        } else {
            ronda_factors::build_factors(&self.factors, &self.options)
        }
    }
}

/// Outcome of running one factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRun {
    /// Definition of the factor.
    pub definition: FactorDefinition,
    /// Stored id, when persisted.
    pub factor_id: Option<FactorId>,
    /// Normalized values.
    pub values: Vec<ScoredValue>,
    /// Upsert counts, when persisted.
    pub summary: Option<UpsertSummary>,
}

/// Runs factors against one history source.
pub struct FactorPipeline<'a> {
    history: &'a dyn HistoryAccess,
    sectors: SectorMap,
    normalizer: CrossSectionalNormalizer,
    store: Option<&'a dyn FactorStore>,
    range: DateRange,
}

impl fmt::Debug for FactorPipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactorPipeline")
            .field("sectors", &self.sectors.len())
            .field("normalizer", &self.normalizer)
            .field("persist", &self.store.is_some())
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl<'a> FactorPipeline<'a> {
    /// Pipeline over `history`, loading sector labels once when sector scores are enabled.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] for an invalid normalizer config;
    /// any error from loading sectors.
    pub fn new(
        history: &'a dyn HistoryAccess,
        sectors: &dyn SectorReference,
        config: NormalizeConfig,
    ) -> Result<Self> {
        let normalizer = CrossSectionalNormalizer::new(config)?;
        let sectors = if config.sector_neutral {
            sectors.sectors()?
        } else {
            SectorMap::new()
        };
        Ok(Self {
            history,
            sectors,
            normalizer,
            store: None,
            range: DateRange::all(),
        })
    }

    /// Persist every run to `store`.
    #[must_use]
    pub fn with_store(mut self, store: &'a dyn FactorStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Keep only output dates inside `range`; history before it still feeds lookbacks.
    #[must_use]
    pub const fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    /// Compute, normalize and optionally persist one factor.
    #[instrument(skip_all, fields(factor = factor.name(), run = %run))]
    pub fn run_factor(&self, factor: &dyn Factor, run: &CalcRunId) -> Result<FactorRun> {
        let raw = self.restrict(factor.compute(self.history)?)?;
        let values = self.normalizer.normalize(&raw, &self.sectors)?;
        let definition = factor.definition();

        let (factor_id, summary) = match self.store {
            Some(store) => {
                let factor_id = store.register(&definition)?;
                let summary = store.upsert_values(factor_id, &values, run)?;
                (Some(factor_id), Some(summary))
            }
            None => (None, None),
        };

        info!(rows = values.len(), persisted = summary.is_some(), "factor run complete");
        Ok(FactorRun {
            definition,
            factor_id,
            values,
            summary,
        })
    }

    /// Run `factors` in order, stopping at the first failure.
    #[instrument(skip_all, fields(factors = factors.len(), run = %run))]
    pub fn run(&self, factors: &[Box<dyn Factor>], run: &CalcRunId) -> Result<Vec<FactorRun>> {
        let runs = factors
            .iter()
            .map(|factor| self.run_factor(factor.as_ref(), run))
            .collect::<Result<Vec<_>>>()?;
        info!(
            rows = runs.iter().map(|r| r.values.len()).sum::<usize>(),
            "pipeline complete"
        );
        Ok(runs)
    }

    fn restrict(&self, frame: FactorFrame) -> Result<FactorFrame> {
        if self.range == DateRange::all() {
            return Ok(frame);
        }
        let mut restricted = FactorFrame::new(frame.name());
        let range = self.range;
        restricted.append(
            frame
                .into_rows()
                .into_iter()
                .filter(|row| range.contains(row.trade_date)),
        );
        if restricted.is_empty() {
            return Err(RondaError::InsufficientData(format!(
                "no {} values inside the requested date range",
                restricted.name()
            )));
        }
        Ok(restricted)
    }
}

/// Rebuild a score panel for the weight builder from stored values.
///
/// # Errors
///
/// [`RondaError::UnknownFactor`] when `factor_name` is not registered;
/// [`RondaError::InsufficientData`] when no stored value has `column` in `range`.
pub fn load_score_panel(
    store: &dyn FactorStore,
    factor_name: &str,
    column: ScoreColumn,
    range: &DateRange,
) -> Result<ScorePanel> {
    let registered = store
        .definition(factor_name)?
        .ok_or_else(|| RondaError::UnknownFactor(factor_name.to_string()))?;
    let values = store.load_values(registered.factor_id, range)?;
    info!(factor = factor_name, rows = values.len(), column = %column, "loaded stored scores");
    ScorePanel::from_stored(&values, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_factors::build_factor;
    use ronda_store::Database;
    use ronda_traits::{InMemoryHistory, PriceColumn};

    fn day(n: u32) -> Date {
        Date::from_ymd_opt(2024, 3, n).unwrap()
    }

    fn history() -> InMemoryHistory {
        // Security 1 rises, 2 falls, 3 is flat.
        InMemoryHistory::from_series(
            PriceColumn::AdjClose,
            [
                (1, (1..=6).map(|n| (day(n), 100.0 + f64::from(n))).collect()),
                (2, (1..=6).map(|n| (day(n), 100.0 - f64::from(n))).collect()),
                (3, (1..=6).map(|n| (day(n), 100.0)).collect()),
            ],
        )
    }

    fn momentum() -> Box<dyn Factor> {
        build_factor("momentum_1p_skip_0p", &FactorOptions::default()).unwrap()
    }

    #[test]
    fn test_run_without_store() {
        let history = history();
        let pipeline = FactorPipeline::new(&history, &history, NormalizeConfig::default()).unwrap();
        let run = pipeline
            .run_factor(momentum().as_ref(), &CalcRunId::new("test").unwrap())
            .unwrap();

        assert!(run.factor_id.is_none());
        assert!(run.summary.is_none());
        // Five dates with a lookback of one period, three securities each.
        assert_eq!(run.values.len(), 15);
        let best = run
            .values
            .iter()
            .filter(|v| v.trade_date == day(6))
            .max_by(|a, b| a.market_zscore.total_cmp(&b.market_zscore))
            .unwrap();
        assert_eq!(best.security_id, 1);
        assert_relative_eq!(best.market_rank_pct, 1.0);
    }

    #[test]
    fn test_range_restricts_output_dates() {
        let history = history();
        let range = DateRange::new(Some(day(5)), None).unwrap();
        let pipeline = FactorPipeline::new(&history, &history, NormalizeConfig::default())
            .unwrap()
            .with_range(range);
        let run = pipeline
            .run_factor(momentum().as_ref(), &CalcRunId::new("test").unwrap())
            .unwrap();
        assert_eq!(run.values.len(), 6);

        let empty = DateRange::new(Some(day(20)), None).unwrap();
        let pipeline = FactorPipeline::new(&history, &history, NormalizeConfig::default())
            .unwrap()
            .with_range(empty);
        assert!(matches!(
            pipeline
                .run_factor(momentum().as_ref(), &CalcRunId::new("test").unwrap())
                .unwrap_err(),
            RondaError::InsufficientData(_)
        ));
    }

    #[test]
    fn test_persisted_run_and_panel() {
        let history = history();
        let db = Database::in_memory().unwrap();
        db.initialize_schema().unwrap();
        let store = db.factor_store();
        let pipeline = FactorPipeline::new(&history, &history, NormalizeConfig::default())
            .unwrap()
            .with_store(&store);

        let run_id = CalcRunId::new("first").unwrap();
        let runs = pipeline.run(&[momentum()], &run_id).unwrap();
        assert_eq!(runs[0].summary.unwrap().inserted, 15);

        let again = pipeline.run(&[momentum()], &run_id).unwrap();
        assert_eq!(again[0].factor_id, runs[0].factor_id);
        assert_eq!(again[0].summary.unwrap().updated, 15);

        let panel = load_score_panel(
            &store,
            "momentum_1p_skip_0p",
            ScoreColumn::MarketZscore,
            &DateRange::all(),
        )
        .unwrap();
        assert_eq!(panel.dates().len(), 5);
        assert_eq!(panel.securities(), &[1, 2, 3]);

        assert!(matches!(
            load_score_panel(&store, "nope", ScoreColumn::Raw, &DateRange::all()).unwrap_err(),
            RondaError::UnknownFactor(_)
        ));
    }

    #[test]
    fn test_config_builds_default_set() {
        let config = PipelineConfig::default();
        assert_eq!(config.build_factors().unwrap().len(), 11);

        let named = PipelineConfig {
            factors: vec!["earnings_yield".to_string()],
            ..PipelineConfig::default()
        };
        assert_eq!(named.build_factors().unwrap()[0].name(), "earnings_yield");
    }
}
