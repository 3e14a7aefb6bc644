//! Common types used throughout the ronda pipeline.
//!
//! This module defines the market data records consumed from history access
//! (prices, fundamentals, sector labels) and the sparse raw factor table
//! produced by factor math.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, RondaError};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Stable integer identifier of a security.
pub type SecurityId = i64;

/// Identifier assigned to a factor definition on first registration.
pub type FactorId = i64;

/// Security to sector label mapping. Securities without a label are absent.
pub type SectorMap = HashMap<SecurityId, String>;

/// Price field of the daily price table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PriceColumn {
    /// Split and dividend adjusted close.
    #[default]
    AdjClose,
    /// Raw close.
    Close,
    /// Open.
    Open,
    /// High.
    High,
    /// Low.
    Low,
}

impl PriceColumn {
    /// Every price column.
    pub const ALL: [Self; 5] = [Self::AdjClose, Self::Close, Self::Open, Self::High, Self::Low];

    /// Column name in the warehouse.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AdjClose => "adj_close",
            Self::Close => "close",
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceColumn {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "adj_close" => Ok(Self::AdjClose),
            "close" => Ok(Self::Close),
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            other => Err(RondaError::UnknownOption {
                kind: "price column",
                value: other.to_string(),
            }),
        }
    }
}

/// Inclusive date range; `None` bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date included.
    pub start: Option<Date>,
    /// Last date included.
    pub end: Option<Date>,
}

impl DateRange {
    /// Range covering every date.
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Range between two optional bounds.
    pub fn new(start: Option<Date>, end: Option<Date>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(RondaError::invalid_parameter(
                "date_range",
                format!("start {s} is after end {e}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// One price observation as supplied by history access.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Trading date.
    pub trade_date: Date,
    /// Price in the requested column; `None` when missing upstream.
    pub price: Option<f64>,
}

/// A point-in-time fundamental disclosure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    /// Security identifier.
    pub security_id: SecurityId,
    /// End of the reporting period; usable from this date onwards.
    pub period_end: Date,
    /// Metric name, e.g. `eps` or `revenue`.
    pub metric: String,
    /// Reported value.
    pub value: f64,
}

/// Cleaned daily price history of one security.
///
/// Dates are strictly increasing and every price is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    security_id: SecurityId,
    dates: Vec<Date>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series, rejecting unordered or duplicate dates and non-finite prices.
    pub fn new(security_id: SecurityId, dates: Vec<Date>, prices: Vec<f64>) -> Result<Self> {
        if dates.len() != prices.len() {
            return Err(RondaError::InvalidData(format!(
                "security {security_id}: {} dates but {} prices",
                dates.len(),
                prices.len()
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(RondaError::InvalidData(format!(
                "security {security_id}: trade dates not strictly increasing at {}",
                w[1]
            )));
        }
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(RondaError::InvalidData(format!(
                "security {security_id}: non-finite price"
            )));
        }
        Ok(Self {
            security_id,
            dates,
            prices,
        })
    }

    /// Security identifier.
    pub const fn security_id(&self) -> SecurityId {
        self.security_id
    }

    /// Trading dates, ascending.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Prices aligned with [`Self::dates`].
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// One defined raw factor value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorRow {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Computation date.
    pub trade_date: Date,
    /// Raw factor value; always finite.
    pub raw_value: f64,
}

/// Sparse table of raw factor values.
///
/// Only defined values are stored: undefined entries are omitted rather than
/// encoded as a sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorFrame {
    name: String,
    rows: Vec<FactorRow>,
}

impl FactorFrame {
    /// Empty frame for the named factor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Factor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[FactorRow] {
        &self.rows
    }

    /// Consume the frame, returning its rows.
    pub fn into_rows(self) -> Vec<FactorRow> {
        self.rows
    }

    /// Number of defined values.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no value is defined.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append one value if it is defined and finite.
    pub fn push(&mut self, security_id: SecurityId, trade_date: Date, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.rows.push(FactorRow {
                security_id,
                trade_date,
                raw_value: v,
            });
        }
    }

    /// Append a security's date-aligned values, skipping undefined ones.
    pub fn extend_series(&mut self, security_id: SecurityId, dates: &[Date], values: &[Option<f64>]) {
        for (date, value) in dates.iter().zip(values) {
            self.push(security_id, *date, *value);
        }
    }

    /// Append rows from another frame.
    pub fn append(&mut self, rows: impl IntoIterator<Item = FactorRow>) {
        self.rows
            .extend(rows.into_iter().filter(|r| r.raw_value.is_finite()));
    }

    /// Sort rows by `(security_id, trade_date)`.
    pub fn sort(&mut self) {
        self.rows
            .sort_by(|a, b| (a.security_id, a.trade_date).cmp(&(b.security_id, b.trade_date)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_price_series_rejects_unordered_dates() {
        let err = PriceSeries::new(1, vec![d(2), d(1)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));

        let err = PriceSeries::new(1, vec![d(1), d(1)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }

    #[test]
    fn test_price_series_rejects_length_mismatch() {
        assert!(PriceSeries::new(1, vec![d(1)], vec![]).is_err());
    }

    #[test]
    fn test_price_series_accessors() {
        let series = PriceSeries::new(7, vec![d(1), d(2)], vec![10.0, 11.0]).unwrap();
        assert_eq!(series.security_id(), 7);
        assert_eq!(series.len(), 2);
        assert_eq!(series.prices(), &[10.0, 11.0]);
    }

    #[test]
    fn test_factor_frame_skips_undefined() {
        let mut frame = FactorFrame::new("test");
        frame.extend_series(
            1,
            &[d(1), d(2), d(3)],
            &[None, Some(0.5), Some(f64::NAN)],
        );
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.rows()[0].trade_date, d(2));
    }

    #[test]
    fn test_date_range_contains() {
        let range = DateRange::new(Some(d(2)), Some(d(4))).unwrap();
        assert!(!range.contains(d(1)));
        assert!(range.contains(d(2)));
        assert!(range.contains(d(4)));
        assert!(!range.contains(d(5)));
        assert!(DateRange::all().contains(d(1)));
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        assert!(DateRange::new(Some(d(5)), Some(d(1))).is_err());
    }

    #[test]
    fn test_price_column_round_trip_names() {
        assert_eq!("adj_close".parse::<PriceColumn>().unwrap(), PriceColumn::AdjClose);
        assert_eq!(PriceColumn::Close.to_string(), "close");
        assert!("vwap".parse::<PriceColumn>().is_err());
    }
}
