//! Price, fundamental and sector history read from the warehouse.

use ronda_traits::{
    Date, DateRange, FundamentalRecord, HistoryAccess, PriceColumn, PriceRow, Result, RondaError,
    SectorMap, SectorReference, SecurityId,
};
use rusqlite::{params, params_from_iter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::{Database, format_date, read_date};

/// One row of the `securities` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRecord {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Ticker symbol.
    pub ticker: String,
    /// Sector label, if known.
    pub sector: Option<String>,
}

/// One row of the `prices` table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Trading date.
    pub trade_date: Date,
    /// Adjusted close.
    pub adj_close: Option<f64>,
    /// Close.
    pub close: Option<f64>,
    /// Open.
    pub open: Option<f64>,
    /// High.
    pub high: Option<f64>,
    /// Low.
    pub low: Option<f64>,
}

impl PriceBar {
    /// Bar with every price field absent.
    pub const fn empty(security_id: SecurityId, trade_date: Date) -> Self {
        Self {
            security_id,
            trade_date,
            adj_close: None,
            close: None,
            open: None,
            high: None,
            low: None,
        }
    }

    /// Mutable access to one price field.
    pub const fn field_mut(&mut self, column: PriceColumn) -> &mut Option<f64> {
        match column {
            PriceColumn::AdjClose => &mut self.adj_close,
            PriceColumn::Close => &mut self.close,
            PriceColumn::Open => &mut self.open,
            PriceColumn::High => &mut self.high,
            PriceColumn::Low => &mut self.low,
        }
    }
}

/// Warehouse history.
#[derive(Debug, Clone)]
pub struct SqliteHistory {
    db: Database,
}

impl SqliteHistory {
    pub(crate) const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or replace security reference rows.
    pub fn insert_securities(&self, securities: &[SecurityRecord]) -> Result<usize> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction().map_err(RondaError::storage)?;
        for security in securities {
            tx.execute(
                "INSERT OR REPLACE INTO securities (security_id, ticker, sector) VALUES (?1, ?2, ?3)",
                params![security.security_id, security.ticker, security.sector],
            )
            .map_err(RondaError::storage)?;
        }
        tx.commit().map_err(RondaError::storage)?;

        info!(rows = securities.len(), "stored securities");
        Ok(securities.len())
    }

    /// Insert or replace daily price bars.
    pub fn insert_prices(&self, bars: &[PriceBar]) -> Result<usize> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction().map_err(RondaError::storage)?;
        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO prices
                    (security_id, trade_date, adj_close, close, open, high, low)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.security_id,
                    format_date(bar.trade_date),
                    bar.adj_close,
                    bar.close,
                    bar.open,
                    bar.high,
                    bar.low
                ],
            )
            .map_err(RondaError::storage)?;
        }
        tx.commit().map_err(RondaError::storage)?;

        info!(rows = bars.len(), "stored price bars");
        Ok(bars.len())
    }

    /// Insert or replace fundamental records; a repeated key keeps the last record.
    pub fn insert_fundamentals(&self, records: &[FundamentalRecord]) -> Result<usize> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction().map_err(RondaError::storage)?;
        for record in records {
            tx.execute(
                "INSERT OR REPLACE INTO fundamentals (security_id, period_end, metric, value)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.security_id,
                    format_date(record.period_end),
                    record.metric,
                    record.value
                ],
            )
            .map_err(RondaError::storage)?;
        }
        tx.commit().map_err(RondaError::storage)?;

        info!(rows = records.len(), "stored fundamentals");
        Ok(records.len())
    }

    /// Distinct trading dates inside `range`, ascending.
    pub fn trading_dates(&self, range: &DateRange) -> Result<Vec<Date>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT trade_date FROM prices
                 WHERE (?1 IS NULL OR trade_date >= ?1) AND (?2 IS NULL OR trade_date <= ?2)
                 ORDER BY trade_date",
            )
            .map_err(RondaError::storage)?;
        let rows = stmt
            .query_map(
                params![range.start.map(format_date), range.end.map(format_date)],
                |row| read_date(row, 0),
            )
            .map_err(RondaError::storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(RondaError::storage)
    }
}

impl HistoryAccess for SqliteHistory {
    fn prices(&self, column: PriceColumn, range: &DateRange) -> Result<Vec<PriceRow>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT security_id, trade_date, {column} FROM prices
                 WHERE (?1 IS NULL OR trade_date >= ?1) AND (?2 IS NULL OR trade_date <= ?2)
                 ORDER BY security_id, trade_date",
                column = column.as_str()
            ))
            .map_err(RondaError::storage)?;

        let rows = stmt
            .query_map(
                params![range.start.map(format_date), range.end.map(format_date)],
                |row| {
                    Ok(PriceRow {
                        security_id: row.get(0)?,
                        trade_date: read_date(row, 1)?,
                        price: row.get(2)?,
                    })
                },
            )
            .map_err(RondaError::storage)?;
        let rows = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(RondaError::storage)?;

        debug!(column = %column, rows = rows.len(), "loaded prices");
        Ok(rows)
    }

    fn fundamentals(&self, metrics: &[&str]) -> Result<Vec<FundamentalRecord>> {
        if metrics.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; metrics.len()].join(", ");
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT security_id, period_end, metric, value FROM fundamentals
                 WHERE metric IN ({placeholders})
                 ORDER BY security_id, period_end, metric"
            ))
            .map_err(RondaError::storage)?;

        let rows = stmt
            .query_map(params_from_iter(metrics.iter()), |row| {
                Ok(FundamentalRecord {
                    security_id: row.get(0)?,
                    period_end: read_date(row, 1)?,
                    metric: row.get(2)?,
                    value: row.get(3)?,
                })
            })
            .map_err(RondaError::storage)?;
        let rows = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(RondaError::storage)?;

        debug!(metrics = metrics.len(), rows = rows.len(), "loaded fundamentals");
        Ok(rows)
    }
}

impl SectorReference for SqliteHistory {
    fn sectors(&self) -> Result<SectorMap> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare("SELECT security_id, sector FROM securities WHERE sector IS NOT NULL")
            .map_err(RondaError::storage)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, SecurityId>(0)?, row.get::<_, String>(1)?)))
            .map_err(RondaError::storage)?;
        rows.collect::<rusqlite::Result<SectorMap>>()
            .map_err(RondaError::storage)
    }
}
