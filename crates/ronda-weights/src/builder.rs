//! Target-weight construction.
//!
//! Weights are computed per date from that date's cross-section, realized
//! only on rebalance dates, and carried forward unchanged over the daily
//! index until the next rebalance date.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use ndarray::{Array1, Array2};
use ronda_traits::{Date, PriceRow, Result, RondaError};
use tracing::{debug, info};

use crate::calendar::rebalance_dates;
use crate::config::{RankDirection, Strategy, WeightConfig, WeightingScheme};
use crate::matrix::{PriceMatrix, SimulationInput, TargetWeightMatrix};
use crate::panel::ScorePanel;

/// Builds target-weight matrices from score panels.
#[derive(Debug, Clone, Copy)]
pub struct WeightBuilder {
    config: WeightConfig,
}

impl WeightBuilder {
    /// Create a builder, validating the configuration.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] naming the offending parameter.
    pub fn new(config: WeightConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The builder configuration.
    pub const fn config(&self) -> &WeightConfig {
        &self.config
    }

    /// Weights for one cross-section of `(column, score)` pairs.
    ///
    /// Returns one entry per selected column; unselected columns are omitted.
    pub fn cross_section_weights(&self, candidates: &[(usize, f64)]) -> Vec<(usize, f64)> {
        let ranked = self.rank(candidates);
        let scheme = self.config.weighting;

        match self.config.strategy {
            Strategy::TopN { size } => {
                let n = size.resolve(ranked.len());
                allocate(&ranked[..n], 1.0, scheme)
            }
            Strategy::LongShort { size } => {
                let n = size.resolve(ranked.len());
                let (long, rest) = ranked.split_at(n);
                let short = &rest[rest.len().saturating_sub(n)..];
                let mut weights = allocate(long, self.config.long_exposure, scheme);
                weights.extend(allocate(short, -self.config.short_exposure, scheme));
                weights
            }
            Strategy::Threshold { upper, lower } => {
                let long: Vec<(usize, f64)> =
                    ranked.iter().copied().filter(|(_, s)| *s > upper).collect();
                let short: Vec<(usize, f64)> =
                    ranked.iter().copied().filter(|(_, s)| *s < lower).collect();
                let mut weights = allocate(&long, self.config.long_exposure, scheme);
                weights.extend(allocate(&short, -self.config.short_exposure, scheme));
                weights
            }
        }
    }

    /// Realized weights over the panel's own dates.
    ///
    /// # Errors
    ///
    /// [`RondaError::InsufficientData`] when the panel has no dates.
    pub fn build(&self, panel: &ScorePanel) -> Result<TargetWeightMatrix> {
        self.build_on(panel, panel.dates())
    }

    /// Realized weights over a daily `index`.
    ///
    /// Rebalance dates are taken from `index`; a rebalance date without
    /// scores holds zero weight until the next one, and index dates before
    /// the first rebalance date hold zero weight.
    pub fn build_on(&self, panel: &ScorePanel, index: &[Date]) -> Result<TargetWeightMatrix> {
        let index: Vec<Date> = index.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if index.is_empty() {
            return Err(RondaError::InsufficientData(
                "empty date index for weights".to_string(),
            ));
        }

        let rebalances = rebalance_dates(&index, self.config.frequency);
        let n_securities = panel.securities().len();
        let mut weights = Array2::<f64>::zeros((index.len(), n_securities));

        let mut next = 0;
        let mut held = Array1::<f64>::zeros(n_securities);
        for (i, date) in index.iter().enumerate() {
            if next < rebalances.len() && rebalances[next] == *date {
                held = self.realize(panel, *date);
                next += 1;
            }
            weights.row_mut(i).assign(&held);
        }

        info!(
            strategy = self.config.strategy.name(),
            frequency = %self.config.frequency,
            dates = index.len(),
            rebalances = rebalances.len(),
            securities = n_securities,
            "built target weights"
        );
        Ok(TargetWeightMatrix::new(
            index,
            panel.securities().to_vec(),
            weights,
        ))
    }

    /// Weights over the trading dates of `prices`, paired with the aligned price matrix.
    ///
    /// # Errors
    ///
    /// [`RondaError::InsufficientData`] when `prices` is empty.
    pub fn build_simulation(
        &self,
        panel: &ScorePanel,
        prices: &[PriceRow],
    ) -> Result<SimulationInput> {
        let index: Vec<Date> = prices.iter().map(|r| r.trade_date).collect();
        let weights = self.build_on(panel, &index)?;
        let prices = PriceMatrix::from_rows(prices, weights.dates(), weights.securities());
        SimulationInput::new(weights, prices)
    }

    fn realize(&self, panel: &ScorePanel, date: Date) -> Array1<f64> {
        let mut row = Array1::<f64>::zeros(panel.securities().len());
        let candidates = panel.cross_section(date);
        let selected = self.cross_section_weights(&candidates);
        debug!(%date, candidates = candidates.len(), selected = selected.len(), "rebalance");
        for (col, weight) in selected {
            row[col] = weight;
        }
        row
    }

    /// Candidates best first; ties keep ascending security order.
    fn rank(&self, candidates: &[(usize, f64)]) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = candidates
            .iter()
            .copied()
            .filter(|(_, s)| s.is_finite())
            .collect();
        let direction = self.config.direction;
        ranked.sort_by(|a, b| {
            let by_score = match direction {
                RankDirection::HigherIsBetter => b.1.total_cmp(&a.1),
                RankDirection::LowerIsBetter => a.1.total_cmp(&b.1),
            };
            match by_score {
                Ordering::Equal => a.0.cmp(&b.0),
                other => other,
            }
        });
        ranked
    }
}

/// Share `exposure` among `selected`; a zero score total yields zero weights.
fn allocate(selected: &[(usize, f64)], exposure: f64, scheme: WeightingScheme) -> Vec<(usize, f64)> {
    if selected.is_empty() {
        return Vec::new();
    }
    match scheme {
        WeightingScheme::Equal => {
            let w = exposure / selected.len() as f64;
            selected.iter().map(|(col, _)| (*col, w)).collect()
        }
        WeightingScheme::Score => {
            let total: f64 = selected.iter().map(|(_, s)| s.abs()).sum();
            if total > 0.0 && total.is_finite() {
                selected
                    .iter()
                    .map(|(col, s)| (*col, exposure * s.abs() / total))
                    .collect()
            } else {
                selected.iter().map(|(col, _)| (*col, 0.0)).collect()
            }
        }
    }
}
