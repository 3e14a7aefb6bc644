//! `import` command: CSV files into the warehouse.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use ronda::store::{PriceBar, SecurityRecord, SqliteHistory};
use ronda::traits::frame::{
    fundamentals_from_frame, has_column, i64_values, price_rows_from_frame, str_values,
};
use ronda::traits::{Date, PriceColumn, SecurityId};

use crate::cmd::open_database;
use crate::config::AppConfig;

/// Load whichever of the three files are given.
pub(crate) fn run(
    config: &AppConfig,
    prices: Option<&Path>,
    fundamentals: Option<&Path>,
    securities: Option<&Path>,
) -> Result<()> {
    if prices.is_none() && fundamentals.is_none() && securities.is_none() {
        anyhow::bail!("nothing to import: pass --prices, --fundamentals or --securities");
    }
    let history = open_database(config)?.history();

    if let Some(path) = securities {
        let n = history.insert_securities(&security_records(&read_csv(path)?)?)?;
        println!("Imported {n} securities from {}", path.display());
    }
    if let Some(path) = prices {
        let n = import_prices(&history, &read_csv(path)?)?;
        println!("Imported {n} price bars from {}", path.display());
    }
    if let Some(path) = fundamentals {
        let records = fundamentals_from_frame(&read_csv(path)?)?;
        let n = history.insert_fundamentals(&records)?;
        println!("Imported {n} fundamental records from {}", path.display());
    }
    Ok(())
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("reading {}", path.display()))
}

fn price_bars(df: &DataFrame) -> Result<Vec<PriceBar>> {
    if !PriceColumn::ALL.iter().any(|c| has_column(df, c.as_str())) {
        anyhow::bail!("prices file has none of adj_close, close, open, high, low");
    }
    let mut bars: BTreeMap<(SecurityId, Date), PriceBar> = BTreeMap::new();
    for column in PriceColumn::ALL {
        if !has_column(df, column.as_str()) {
            continue;
        }
        for row in price_rows_from_frame(df, column)? {
            *bars
                .entry((row.security_id, row.trade_date))
                .or_insert_with(|| PriceBar::empty(row.security_id, row.trade_date))
                .field_mut(column) = row.price;
        }
    }
    Ok(bars.into_values().collect())
}

fn import_prices(history: &SqliteHistory, df: &DataFrame) -> Result<usize> {
    Ok(history.insert_prices(&price_bars(df)?)?)
}

fn security_records(df: &DataFrame) -> Result<Vec<SecurityRecord>> {
    let ids = i64_values(df, "security_id")?;
    let tickers = str_values(df, "ticker")?;
    let sectors = if has_column(df, "sector") {
        str_values(df, "sector")?
    } else {
        vec![None; ids.len()]
    };

    ids.into_iter()
        .zip(tickers)
        .zip(sectors)
        .enumerate()
        .map(|(i, ((id, ticker), sector))| {
            let security_id = id.with_context(|| format!("securities row {i}: null security_id"))?;
            Ok(SecurityRecord {
                security_id,
                ticker: ticker.unwrap_or_else(|| security_id.to_string()),
                sector,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_bars_merge_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(
            &path,
            "security_id,trade_date,adj_close,close\n1,2024-01-02,10.5,11\n1,2024-01-03,,12\n",
        )
        .unwrap();

        let bars = price_bars(&read_csv(&path).unwrap()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].adj_close, Some(10.5));
        assert_eq!(bars[0].close, Some(11.0));
        assert_eq!(bars[1].adj_close, None);
        assert_eq!(bars[1].open, None);
    }

    #[test]
    fn test_security_records_without_sector() {
        let df = df!(
            "security_id" => [1i64, 2],
            "ticker" => ["AAA", "BBB"],
        )
        .unwrap();
        let records = security_records(&df).unwrap();
        assert_eq!(records[1].ticker, "BBB");
        assert!(records.iter().all(|r| r.sector.is_none()));
    }
}
