//! Access to cleaned price and fundamental history.
//!
//! History acquisition itself lives outside this workspace; factor math only
//! sees it through [`HistoryAccess`] and [`SectorReference`]. The
//! [`InMemoryHistory`] implementation backs tests and frame-based callers.

use std::collections::{BTreeMap, HashSet};

use crate::types::{
    Date, DateRange, FundamentalRecord, PriceColumn, PriceRow, PriceSeries, SectorMap, SecurityId,
};
use crate::{Result, RondaError};

/// Source of daily prices and point-in-time fundamentals.
pub trait HistoryAccess: Send + Sync {
    /// Price rows for `column` inside `range`.
    ///
    /// Rows carry no duplicate `(security_id, trade_date)` keys and are sorted
    /// ascending by `(security_id, trade_date)`.
    fn prices(&self, column: PriceColumn, range: &DateRange) -> Result<Vec<PriceRow>>;

    /// Fundamental records whose metric is in `metrics`, sorted by
    /// `(security_id, period_end)`.
    fn fundamentals(&self, metrics: &[&str]) -> Result<Vec<FundamentalRecord>>;
}

/// Source of security to sector labels.
pub trait SectorReference: Send + Sync {
    /// Sector label of every labelled security.
    fn sectors(&self) -> Result<SectorMap>;
}

/// Clean price rows and split them into one ordered series per security.
///
/// Rows with a missing or non-finite price are dropped, duplicate
/// `(security_id, trade_date)` keys keep their first occurrence, and the
/// series come back ordered by security id.
///
/// # Errors
///
/// Returns [`RondaError::InsufficientData`] when nothing survives cleaning.
pub fn partition_prices(rows: &[PriceRow]) -> Result<Vec<PriceSeries>> {
    let mut seen: HashSet<(SecurityId, Date)> = HashSet::with_capacity(rows.len());
    let mut grouped: BTreeMap<SecurityId, Vec<(Date, f64)>> = BTreeMap::new();

    for row in rows {
        let Some(price) = row.price.filter(|p| p.is_finite()) else {
            continue;
        };
        if seen.insert((row.security_id, row.trade_date)) {
            grouped
                .entry(row.security_id)
                .or_default()
                .push((row.trade_date, price));
        }
    }

    if grouped.is_empty() {
        return Err(RondaError::InsufficientData(
            "no price data available after cleaning".to_string(),
        ));
    }

    grouped
        .into_iter()
        .map(|(security_id, mut points)| {
            points.sort_by_key(|(date, _)| *date);
            let (dates, prices): (Vec<Date>, Vec<f64>) = points.into_iter().unzip();
            PriceSeries::new(security_id, dates, prices)
        })
        .collect()
}

/// History held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    prices: BTreeMap<PriceColumn, Vec<PriceRow>>,
    fundamentals: Vec<FundamentalRecord>,
    sectors: SectorMap,
}

impl InMemoryHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rows of one price column.
    #[must_use]
    pub fn with_prices(mut self, column: PriceColumn, rows: Vec<PriceRow>) -> Self {
        self.prices.insert(column, rows);
        self
    }

    /// Set the fundamental records.
    #[must_use]
    pub fn with_fundamentals(mut self, records: Vec<FundamentalRecord>) -> Self {
        self.fundamentals = records;
        self
    }

    /// Set the sector labels.
    #[must_use]
    pub fn with_sectors(mut self, sectors: SectorMap) -> Self {
        self.sectors = sectors;
        self
    }

    /// Convenience constructor from `(security_id, [(date, price)])` series.
    pub fn from_series(
        column: PriceColumn,
        series: impl IntoIterator<Item = (SecurityId, Vec<(Date, f64)>)>,
    ) -> Self {
        let rows = series
            .into_iter()
            .flat_map(|(security_id, points)| {
                points.into_iter().map(move |(trade_date, price)| PriceRow {
                    security_id,
                    trade_date,
                    price: Some(price),
                })
            })
            .collect();
        Self::new().with_prices(column, rows)
    }
}

impl HistoryAccess for InMemoryHistory {
    fn prices(&self, column: PriceColumn, range: &DateRange) -> Result<Vec<PriceRow>> {
        let rows = self
            .prices
            .get(&column)
            .ok_or_else(|| RondaError::MissingColumn(column.to_string()))?;

        let mut out: Vec<PriceRow> = rows
            .iter()
            .filter(|r| range.contains(r.trade_date))
            .copied()
            .collect();
        out.sort_by_key(|r| (r.security_id, r.trade_date));
        out.dedup_by_key(|r| (r.security_id, r.trade_date));
        Ok(out)
    }

    fn fundamentals(&self, metrics: &[&str]) -> Result<Vec<FundamentalRecord>> {
        let mut out: Vec<FundamentalRecord> = self
            .fundamentals
            .iter()
            .filter(|r| metrics.contains(&r.metric.as_str()))
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.security_id, r.period_end));
        Ok(out)
    }
}

impl SectorReference for InMemoryHistory {
    fn sectors(&self) -> Result<SectorMap> {
        Ok(self.sectors.clone())
    }
}
