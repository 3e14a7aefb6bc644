//! Target-weight and price matrices handed to the portfolio simulator.
//!
//! Both matrices are dense `date × security` grids over the same axes so the
//! simulator can line them up without re-indexing. Exports are wide frames:
//! a `trade_date` column followed by one column per security id.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use ndarray::Array2;
use polars::prelude::*;
use ronda_traits::frame::date_column;
use ronda_traits::{Date, PriceRow, Result, RondaError, SecurityId};
use tracing::info;

/// Target weights per date and security.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetWeightMatrix {
    dates: Vec<Date>,
    securities: Vec<SecurityId>,
    weights: Array2<f64>,
}

impl TargetWeightMatrix {
    pub(crate) fn new(dates: Vec<Date>, securities: Vec<SecurityId>, weights: Array2<f64>) -> Self {
        debug_assert_eq!(weights.dim(), (dates.len(), securities.len()));
        Self {
            dates,
            securities,
            weights,
        }
    }

    /// Row axis.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column axis.
    pub fn securities(&self) -> &[SecurityId] {
        &self.securities
    }

    /// The weight grid.
    pub const fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Weight of `security` on `date`; `None` off the axes.
    pub fn weight(&self, date: Date, security: SecurityId) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        let col = self.securities.binary_search(&security).ok()?;
        Some(self.weights[[row, col]])
    }

    /// Net exposure on each date.
    pub fn net_exposure(&self) -> Vec<f64> {
        self.weights.rows().into_iter().map(|r| r.sum()).collect()
    }

    /// Sum of positive weights on each date.
    pub fn long_exposure(&self) -> Vec<f64> {
        self.weights
            .rows()
            .into_iter()
            .map(|r| r.iter().filter(|w| **w > 0.0).sum())
            .collect()
    }

    /// Sum of negative weights on each date.
    pub fn short_exposure(&self) -> Vec<f64> {
        self.weights
            .rows()
            .into_iter()
            .map(|r| r.iter().filter(|w| **w < 0.0).sum())
            .collect()
    }

    /// Wide frame of the weights.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        wide_frame(&self.dates, &self.securities, &self.weights)
    }

    /// Write the wide frame as CSV.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_csv(&mut self.to_dataframe()?, path)?;
        info!(path = %path.display(), dates = self.dates.len(), securities = self.securities.len(), "wrote weights");
        Ok(())
    }
}

/// Prices on the axes of a weight matrix; absent prices are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<Date>,
    securities: Vec<SecurityId>,
    prices: Array2<f64>,
}

impl PriceMatrix {
    /// Lay `rows` out on the given axes; rows off the axes are ignored.
    pub fn from_rows(rows: &[PriceRow], dates: &[Date], securities: &[SecurityId]) -> Self {
        let date_idx: HashMap<Date, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let sec_idx: HashMap<SecurityId, usize> =
            securities.iter().enumerate().map(|(i, s)| (*s, i)).collect();

        let mut prices = Array2::from_elem((dates.len(), securities.len()), f64::NAN);
        for row in rows {
            if let (Some(&i), Some(&j), Some(price)) = (
                date_idx.get(&row.trade_date),
                sec_idx.get(&row.security_id),
                row.price,
            ) {
                prices[[i, j]] = price;
            }
        }

        Self {
            dates: dates.to_vec(),
            securities: securities.to_vec(),
            prices,
        }
    }

    /// Row axis.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column axis.
    pub fn securities(&self) -> &[SecurityId] {
        &self.securities
    }

    /// The price grid.
    pub const fn prices(&self) -> &Array2<f64> {
        &self.prices
    }

    /// Wide frame of the prices.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        wide_frame(&self.dates, &self.securities, &self.prices)
    }

    /// Write the wide frame as CSV.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_csv(&mut self.to_dataframe()?, path)?;
        info!(path = %path.display(), "wrote prices");
        Ok(())
    }
}

/// Target weights and the prices they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInput {
    /// Target weights.
    pub weights: TargetWeightMatrix,
    /// Prices on the same axes.
    pub prices: PriceMatrix,
}

impl SimulationInput {
    /// Pair a weight matrix with a price matrix.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidData`] when the axes differ.
    pub fn new(weights: TargetWeightMatrix, prices: PriceMatrix) -> Result<Self> {
        if weights.dates != prices.dates || weights.securities != prices.securities {
            return Err(RondaError::InvalidData(
                "weight and price matrices have different axes".to_string(),
            ));
        }
        Ok(Self { weights, prices })
    }
}

fn wide_frame(dates: &[Date], securities: &[SecurityId], grid: &Array2<f64>) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(securities.len() + 1);
    columns.push(date_column("trade_date", dates)?);
    for (j, sid) in securities.iter().enumerate() {
        let values: Vec<Option<f64>> = grid
            .column(j)
            .iter()
            .map(|v| v.is_finite().then_some(*v))
            .collect();
        columns.push(Column::new(sid.to_string().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn matrix() -> TargetWeightMatrix {
        TargetWeightMatrix::new(
            vec![d(3), d(4)],
            vec![10, 20, 30],
            array![[0.5, 0.0, -0.5], [0.25, 0.25, -0.5]],
        )
    }

    #[test]
    fn test_exposures() {
        let m = matrix();
        assert_relative_eq!(m.net_exposure()[1], 0.0);
        assert_relative_eq!(m.long_exposure()[1], 0.5);
        assert_relative_eq!(m.short_exposure()[0], -0.5);
        assert_eq!(m.weight(d(4), 20), Some(0.25));
        assert_eq!(m.weight(d(5), 20), None);
    }

    #[test]
    fn test_price_matrix_alignment() {
        let rows = [
            PriceRow {
                security_id: 20,
                trade_date: d(4),
                price: Some(11.0),
            },
            PriceRow {
                security_id: 99,
                trade_date: d(4),
                price: Some(1.0),
            },
        ];
        let m = matrix();
        let prices = PriceMatrix::from_rows(&rows, m.dates(), m.securities());
        assert_eq!(prices.prices()[[1, 1]], 11.0);
        assert!(prices.prices()[[0, 0]].is_nan());

        let input = SimulationInput::new(m.clone(), prices).unwrap();
        assert_eq!(input.weights, m);

        let other = PriceMatrix::from_rows(&rows, &[d(3)], m.securities());
        assert!(SimulationInput::new(m, other).is_err());
    }

    #[test]
    fn test_wide_frame_and_csv() {
        let m = matrix();
        let df = m.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 4));
        assert_eq!(df.get_column_names_str(), vec!["trade_date", "10", "20", "30"]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");
        m.write_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("trade_date,10,20,30"));
        assert_eq!(text.lines().count(), 3);
    }
}
