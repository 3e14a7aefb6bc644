//! Date × security score panels.

use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;
use ronda_traits::{Date, FactorValue, Result, RondaError, ScoredValue, SecurityId};

use crate::config::ScoreColumn;

/// Scores on a dense date × security grid; absent cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorePanel {
    dates: Vec<Date>,
    securities: Vec<SecurityId>,
    scores: Array2<f64>,
}

impl ScorePanel {
    /// Panel from `(security_id, date, score)` triples.
    ///
    /// Non-finite scores are left absent. A repeated cell keeps its first score.
    ///
    /// # Errors
    ///
    /// [`RondaError::InsufficientData`] when no finite score is given.
    pub fn from_triples(
        triples: impl IntoIterator<Item = (SecurityId, Date, f64)>,
    ) -> Result<Self> {
        let cells: Vec<(SecurityId, Date, f64)> =
            triples.into_iter().filter(|(_, _, s)| s.is_finite()).collect();
        if cells.is_empty() {
            return Err(RondaError::InsufficientData(
                "no scores to build weights from".to_string(),
            ));
        }

        let dates: Vec<Date> = cells
            .iter()
            .map(|(_, d, _)| *d)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let securities: Vec<SecurityId> = cells
            .iter()
            .map(|(s, _, _)| *s)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let date_idx: HashMap<Date, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let sec_idx: HashMap<SecurityId, usize> =
            securities.iter().enumerate().map(|(i, s)| (*s, i)).collect();

        let mut scores = Array2::from_elem((dates.len(), securities.len()), f64::NAN);
        for (sid, date, score) in cells {
            let cell = &mut scores[[date_idx[&date], sec_idx[&sid]]];
            if cell.is_nan() {
                *cell = score;
            }
        }

        Ok(Self {
            dates,
            securities,
            scores,
        })
    }

    /// Panel of one column of freshly normalized rows.
    pub fn from_scored(rows: &[ScoredValue], column: ScoreColumn) -> Result<Self> {
        Self::from_triples(rows.iter().filter_map(|r| {
            column
                .of_scored(r)
                .map(|score| (r.security_id, r.trade_date, score))
        }))
    }

    /// Panel of one column of stored rows.
    pub fn from_stored(rows: &[FactorValue], column: ScoreColumn) -> Result<Self> {
        Self::from_triples(rows.iter().filter_map(|r| {
            column
                .of_stored(r)
                .map(|score| (r.security_id, r.trade_date, score))
        }))
    }

    /// Dates with at least one score, ascending.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Securities with at least one score, ascending.
    pub fn securities(&self) -> &[SecurityId] {
        &self.securities
    }

    /// The score grid.
    pub const fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    /// Row index of `date`.
    pub fn date_index(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Present scores on `date` as `(security column, score)`, by ascending security.
    pub fn cross_section(&self, date: Date) -> Vec<(usize, f64)> {
        let Some(row) = self.date_index(date) else {
            return Vec::new();
        };
        self.scores
            .row(row)
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_finite())
            .map(|(j, s)| (j, *s))
            .collect()
    }
}
