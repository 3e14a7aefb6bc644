//! Per-security valuation ratio series.

use std::collections::{BTreeSet, HashMap, HashSet};

use ronda_traits::{
    Date, DateRange, HistoryAccess, PriceColumn, PriceSeries, Result, SecurityId, partition_prices,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::asof::{DisclosureIndex, asof_backward};
use super::ratios::{Denominator, ValueRatio, safe_ratio};
use crate::partition::map_partitions;

/// Configuration shared by the value factors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    /// Price field used as the daily date index and the earnings yield denominator.
    pub price_column: PriceColumn,

    /// Securities dropped before computation.
    pub exclude_securities: Vec<SecurityId>,

    /// Compute securities on the rayon pool.
    pub parallel: bool,
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            price_column: PriceColumn::AdjClose,
            exclude_securities: Vec::new(),
            parallel: true,
        }
    }
}

/// Ratio series of one security on its own price dates.
#[derive(Debug, Clone)]
pub(crate) struct SecurityRatios {
    pub(crate) security_id: SecurityId,
    pub(crate) dates: Vec<Date>,
    /// `values[k][t]` is ratio `k` at `dates[t]`.
    pub(crate) values: Vec<Vec<Option<f64>>>,
}

/// Compute `ratios` for every security with usable prices.
pub(crate) fn ratio_panel(
    history: &dyn HistoryAccess,
    ratios: &[ValueRatio],
    config: &ValueConfig,
) -> Result<Vec<SecurityRatios>> {
    let metrics: Vec<&str> = ratios
        .iter()
        .flat_map(ValueRatio::metrics)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index = DisclosureIndex::from_records(&history.fundamentals(&metrics)?);

    let mut rows = history.prices(config.price_column, &DateRange::all())?;
    if !config.exclude_securities.is_empty() {
        let excluded: HashSet<SecurityId> = config.exclude_securities.iter().copied().collect();
        let before = rows.len();
        rows.retain(|r| !excluded.contains(&r.security_id));
        debug!(dropped = before - rows.len(), "excluded securities");
    }
    let series = partition_prices(&rows)?;

    if index.securities() == 0 {
        warn!(?metrics, "no fundamentals found; every ratio will be undefined");
    }

    Ok(map_partitions(&series, config.parallel, |s| {
        security_ratios(s, &index, ratios)
    }))
}

fn security_ratios(
    series: &PriceSeries,
    index: &DisclosureIndex,
    ratios: &[ValueRatio],
) -> SecurityRatios {
    let sid = series.security_id();
    let dates = series.dates();
    let mut joined: HashMap<&'static str, Vec<Option<f64>>> = HashMap::new();
    let mut join = |metric: &'static str| -> Vec<Option<f64>> {
        joined
            .entry(metric)
            .or_insert_with(|| asof_backward(dates, index.series(sid, metric)))
            .clone()
    };

    let values = ratios
        .iter()
        .map(|ratio| {
            let numerator = join(ratio.numerator());
            let denominator: Vec<Option<f64>> = match ratio.denominator() {
                Denominator::Price => series.prices().iter().copied().map(Some).collect(),
                Denominator::Metric(metric) => join(metric),
            };
            numerator
                .iter()
                .zip(&denominator)
                .map(|(n, d)| safe_ratio((*n)?, (*d)?))
                .collect()
        })
        .collect();

    SecurityRatios {
        security_id: sid,
        dates: dates.to_vec(),
        values,
    }
}
