//! Conversions between Polars DataFrames and ronda records.
//!
//! # Expected Schemas
//!
//! - prices: `security_id`, `trade_date`, and one or more price columns
//!   (`adj_close`, `close`, `open`, `high`, `low`)
//! - fundamentals: `security_id`, `period_end`, `metric`, `value`
//! - securities: `security_id`, `sector`

use polars::prelude::*;

use crate::store::ScoredValue;
use crate::types::{Date, FundamentalRecord, PriceColumn, PriceRow, SectorMap, SecurityId};
use crate::{Result, RondaError};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

/// Convert a Polars date (days since the Unix epoch) to a [`Date`].
pub fn date_from_days(days: i32) -> Option<Date> {
    Date::from_num_days_from_ce_opt(days + UNIX_EPOCH_FROM_CE)
}

/// Convert a [`Date`] to days since the Unix epoch.
pub fn days_from_date(date: Date) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_FROM_CE
}

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(Column::as_materialized_series)
        .map_err(|_| RondaError::MissingColumn(name.to_string()))
}

/// Whether `df` has a column called `name`.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Values of an integer column, cast to `i64`.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let s = series(df, name)?.cast(&DataType::Int64)?;
    Ok(s.i64()?.into_iter().collect())
}

/// Values of a numeric column, cast to `f64`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let s = series(df, name)?.cast(&DataType::Float64)?;
    Ok(s.f64()?.into_iter().collect())
}

/// Values of a date column.
pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>> {
    let s = series(df, name)?.cast(&DataType::Date)?;
    Ok(s
        .date()?
        .into_iter()
        .map(|d: Option<i32>| d.and_then(date_from_days))
        .collect())
}

/// Values of a string column.
pub fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let s = series(df, name)?;
    Ok(s
        .str()?
        .into_iter()
        .map(|v: Option<&str>| v.map(str::to_string))
        .collect())
}

/// Build a `Date` column from dates.
pub fn date_column(name: &str, dates: &[Date]) -> Result<Column> {
    let days: Vec<i32> = dates.iter().map(|d| days_from_date(*d)).collect();
    let s = Series::new(name.into(), days).cast(&DataType::Date)?;
    Ok(Column::from(s))
}

fn required_keys(
    ids: Vec<Option<i64>>,
    dates: Vec<Option<Date>>,
    date_name: &str,
) -> Result<Vec<(SecurityId, Date)>> {
    ids.into_iter()
        .zip(dates)
        .enumerate()
        .map(|(i, (id, date))| match (id, date) {
            (Some(id), Some(date)) => Ok((id, date)),
            _ => Err(RondaError::InvalidData(format!(
                "row {i}: null security_id or {date_name}"
            ))),
        })
        .collect()
}

/// Price rows for one column of a price frame.
pub fn price_rows_from_frame(df: &DataFrame, column: PriceColumn) -> Result<Vec<PriceRow>> {
    let keys = required_keys(
        i64_values(df, "security_id")?,
        date_values(df, "trade_date")?,
        "trade_date",
    )?;
    let prices = f64_values(df, column.as_str())?;

    Ok(keys
        .into_iter()
        .zip(prices)
        .map(|((security_id, trade_date), price)| PriceRow {
            security_id,
            trade_date,
            price,
        })
        .collect())
}

/// Fundamental records from a long-form fundamentals frame. Null values are skipped.
pub fn fundamentals_from_frame(df: &DataFrame) -> Result<Vec<FundamentalRecord>> {
    let keys = required_keys(
        i64_values(df, "security_id")?,
        date_values(df, "period_end")?,
        "period_end",
    )?;
    let metrics = str_values(df, "metric")?;
    let values = f64_values(df, "value")?;

    Ok(keys
        .into_iter()
        .zip(metrics)
        .zip(values)
        .filter_map(|(((security_id, period_end), metric), value)| {
            Some(FundamentalRecord {
                security_id,
                period_end,
                metric: metric?,
                value: value?,
            })
        })
        .collect())
}

/// Sector labels from a securities frame. Securities with a null sector are left out.
pub fn sectors_from_frame(df: &DataFrame) -> Result<SectorMap> {
    let ids = i64_values(df, "security_id")?;
    let sectors = str_values(df, "sector")?;
    Ok(ids
        .into_iter()
        .zip(sectors)
        .filter_map(|(id, sector)| Some((id?, sector?)))
        .collect())
}

/// Frame of normalized values, one row per [`ScoredValue`].
pub fn scored_to_dataframe(rows: &[ScoredValue]) -> Result<DataFrame> {
    let ids: Vec<i64> = rows.iter().map(|r| r.security_id).collect();
    let dates: Vec<Date> = rows.iter().map(|r| r.trade_date).collect();
    let raw: Vec<f64> = rows.iter().map(|r| r.raw_value).collect();
    let mz: Vec<f64> = rows.iter().map(|r| r.market_zscore).collect();
    let mr: Vec<f64> = rows.iter().map(|r| r.market_rank_pct).collect();
    let sz: Vec<Option<f64>> = rows.iter().map(|r| r.sector_zscore).collect();
    let sr: Vec<Option<f64>> = rows.iter().map(|r| r.sector_rank_pct).collect();

    Ok(DataFrame::new(vec![
        Column::new("security_id".into(), ids),
        date_column("trade_date", &dates)?,
        Column::new("raw_value".into(), raw),
        Column::new("market_zscore".into(), mz),
        Column::new("market_rank_pct".into(), mr),
        Column::new("sector_zscore".into(), sz),
        Column::new("sector_rank_pct".into(), sr),
    ])?)
}
