//! Composite of several valuation ratios.

use std::collections::BTreeMap;

use ndarray::Array1;
use ronda_combine::{Combiner, ComponentScores, EqualWeightCombiner, EqualWeightConfig};
use ronda_traits::{
    Date, Factor, FactorCategory, FactorDefinition, FactorFrame, FactorRow, HistoryAccess, Result,
    RondaError, SecurityId,
};
use tracing::debug;

use super::panel::{ValueConfig, ratio_panel};
use super::ratios::ValueRatio;
use crate::partition::map_partitions;

const COMPOSITE_PREFIX: &str = "value_composite_";

/// Sorted, de-duplicated set of composite components.
///
/// The key determines the composite's factor name, so the same selection
/// always maps to the same name regardless of the order it was given in.
///
/// # Examples
///
/// ```
/// use ronda_factors::value::{CompositeKey, ValueRatio};
///
/// let key = CompositeKey::new([ValueRatio::SalesToPrice, ValueRatio::BookToMarket]).unwrap();
/// assert_eq!(key.name(), "value_composite_book_to_market_sales_to_price");
/// assert_eq!(CompositeKey::all().name(), "value_composite_all");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    components: Vec<ValueRatio>,
}

impl CompositeKey {
    /// Key selecting every sub-factor.
    pub fn all() -> Self {
        Self::from_sorted(ValueRatio::ALL.to_vec())
    }

    /// Key from any selection of sub-factors.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] when the selection is empty.
    pub fn new(components: impl IntoIterator<Item = ValueRatio>) -> Result<Self> {
        let components: Vec<ValueRatio> = components.into_iter().collect();
        if components.is_empty() {
            return Err(RondaError::invalid_parameter(
                "components",
                "a composite needs at least one sub-factor",
            ));
        }
        Ok(Self::from_sorted(components))
    }

    /// Key from sub-factor names; `["all"]` selects every sub-factor.
    ///
    /// # Errors
    ///
    /// [`RondaError::UnknownFactor`] for a name that is not a sub-factor.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if let [only] = names
            && only.as_ref() == "all"
        {
            return Ok(Self::all());
        }
        let components = names
            .iter()
            .map(|n| n.as_ref().parse::<ValueRatio>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(components)
    }

    /// Recover the key from a composite factor name.
    ///
    /// Only canonical names, as produced by [`CompositeKey::name`], are accepted.
    pub fn from_factor_name(name: &str) -> Result<Self> {
        let unknown = || RondaError::UnknownFactor(name.to_string());
        let mut rest = name.strip_prefix(COMPOSITE_PREFIX).ok_or_else(unknown)?;
        if rest == "all" {
            return Ok(Self::all());
        }

        let mut components = Vec::new();
        while !rest.is_empty() {
            let ratio = ValueRatio::ALL
                .into_iter()
                .filter(|r| {
                    rest.strip_prefix(r.name())
                        .is_some_and(|tail| tail.is_empty() || tail.starts_with('_'))
                })
                .max_by_key(|r| r.name().len())
                .ok_or_else(unknown)?;
            components.push(ratio);
            rest = rest[ratio.name().len()..].trim_start_matches('_');
        }

        let key = Self::new(components)?;
        if key.name() != name {
            return Err(unknown());
        }
        Ok(key)
    }

    fn from_sorted(mut components: Vec<ValueRatio>) -> Self {
        components.sort_by_key(|r| r.name());
        components.dedup();
        Self { components }
    }

    /// Components in name order.
    pub fn components(&self) -> &[ValueRatio] {
        &self.components
    }

    /// Whether every sub-factor is selected.
    pub fn is_all(&self) -> bool {
        self.components.len() == ValueRatio::ALL.len()
    }

    /// Composite factor name.
    pub fn name(&self) -> String {
        if self.is_all() {
            return format!("{COMPOSITE_PREFIX}all");
        }
        let parts: Vec<&str> = self.components.iter().map(ValueRatio::name).collect();
        format!("{COMPOSITE_PREFIX}{}", parts.join("_"))
    }
}

/// Members of one date's cross-section with their component values (`NaN` when absent).
type CrossSection = Vec<(SecurityId, Vec<f64>)>;

/// Mean of per-date z-scored valuation ratios.
///
/// Each component is z-scored across the securities defined on a date
/// (population standard deviation, zero for a degenerate cross-section).
/// A security's composite is the mean of its available component z-scores;
/// securities with no available component are omitted.
#[derive(Debug, Clone)]
pub struct ValueComposite {
    key: CompositeKey,
    config: ValueConfig,
    name: String,
}

impl ValueComposite {
    /// Create the composite for `key`.
    pub fn new(key: CompositeKey, config: ValueConfig) -> Self {
        let name = key.name();
        Self { key, config, name }
    }

    /// The selected components.
    pub const fn key(&self) -> &CompositeKey {
        &self.key
    }

    fn score_cross_section(
        &self,
        combiner: &EqualWeightCombiner,
        date: Date,
        members: &CrossSection,
    ) -> Result<Vec<FactorRow>> {
        let components: Vec<ComponentScores> = self
            .key
            .components()
            .iter()
            .enumerate()
            .map(|(k, ratio)| {
                let scores: Array1<f64> = members.iter().map(|(_, row)| row[k]).collect();
                ComponentScores::new(ratio.name(), scores)
            })
            .collect();
        let composite = combiner.combine(&components)?;

        Ok(members
            .iter()
            .zip(composite.iter())
            .filter(|(_, value)| value.is_finite())
            .map(|((security_id, _), value)| FactorRow {
                security_id: *security_id,
                trade_date: date,
                raw_value: *value,
            })
            .collect())
    }
}

impl Factor for ValueComposite {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> FactorDefinition {
        let names: Vec<&str> = self.key.components().iter().map(ValueRatio::name).collect();
        FactorDefinition::new(&self.name, FactorCategory::Value)
            .with_parameter("components", names.clone())
            .with_description(format!("Composite of sub-factors: {}", names.join(", ")))
            .with_formula("mean(z-subfactors)")
            .with_source("fundamentals + prices")
            .with_tags(&["value", "composite"])
    }

    fn compute(&self, history: &dyn HistoryAccess) -> Result<FactorFrame> {
        let panel = ratio_panel(history, self.key.components(), &self.config)?;

        // barrier: every security's ratios are known before any date is scored
        let mut by_date: BTreeMap<Date, CrossSection> = BTreeMap::new();
        for security in &panel {
            for (t, date) in security.dates.iter().enumerate() {
                let row: Vec<f64> = security
                    .values
                    .iter()
                    .map(|v| v[t].unwrap_or(f64::NAN))
                    .collect();
                if row.iter().any(|x| x.is_finite()) {
                    by_date
                        .entry(*date)
                        .or_default()
                        .push((security.security_id, row));
                }
            }
        }
        let cross_sections: Vec<(Date, CrossSection)> = by_date.into_iter().collect();
        debug!(
            factor = %self.name,
            dates = cross_sections.len(),
            "combining value components"
        );

        let combiner = EqualWeightCombiner::new(EqualWeightConfig::zscore_mean());
        let scored = map_partitions(&cross_sections, self.config.parallel, |cross_section| {
            let (date, members) = cross_section;
            self.score_cross_section(&combiner, *date, members)
        });

        let mut frame = FactorFrame::new(&self.name);
        for rows in scored {
            frame.append(rows?);
        }
        if frame.is_empty() {
            return Err(RondaError::InsufficientData(format!(
                "{}: every component is undefined",
                self.name
            )));
        }
        frame.sort();
        Ok(frame)
    }

    fn lookback(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ronda_traits::{FundamentalRecord, InMemoryHistory, PriceColumn};

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn record(security_id: SecurityId, metric: &str, value: f64) -> FundamentalRecord {
        FundamentalRecord {
            security_id,
            period_end: d(1),
            metric: metric.to_string(),
            value,
        }
    }

    fn history() -> InMemoryHistory {
        InMemoryHistory::from_series(
            PriceColumn::AdjClose,
            vec![
                (1, vec![(d(1), 10.0)]),
                (2, vec![(d(1), 10.0)]),
                (3, vec![(d(1), 10.0)]),
            ],
        )
        .with_fundamentals(vec![
            // earnings yield: 0.1, 0.2, 0.3
            record(1, "eps", 1.0),
            record(2, "eps", 2.0),
            record(3, "eps", 3.0),
            // book to market: 3.0, 2.0 and undefined for security 3
            record(1, "total_stockholders_equity", 300.0),
            record(2, "total_stockholders_equity", 200.0),
            record(1, "market_capitalization", 100.0),
            record(2, "market_capitalization", 100.0),
            record(3, "market_capitalization", 100.0),
        ])
    }

    #[test]
    fn test_key_sorts_and_dedups() {
        let key = CompositeKey::new([
            ValueRatio::SalesToPrice,
            ValueRatio::EarningsYield,
            ValueRatio::SalesToPrice,
        ])
        .unwrap();
        assert_eq!(
            key.components(),
            &[ValueRatio::EarningsYield, ValueRatio::SalesToPrice]
        );
        assert_eq!(key.name(), "value_composite_earnings_yield_sales_to_price");
    }

    #[test]
    fn test_key_all_selected_explicitly() {
        let key = CompositeKey::new(ValueRatio::ALL.into_iter().rev()).unwrap();
        assert!(key.is_all());
        assert_eq!(key.name(), "value_composite_all");
    }

    #[test]
    fn test_key_parse() {
        assert!(CompositeKey::parse(&["all"]).unwrap().is_all());
        assert!(matches!(
            CompositeKey::parse(&["earnings_yield", "momentum"]).unwrap_err(),
            RondaError::UnknownFactor(_)
        ));
        assert!(CompositeKey::parse::<&str>(&[]).is_err());
    }

    #[test]
    fn test_key_from_factor_name_round_trips() {
        let key = CompositeKey::new([ValueRatio::FreeCashFlowYield, ValueRatio::BookToMarket])
            .unwrap();
        assert_eq!(CompositeKey::from_factor_name(&key.name()).unwrap(), key);
        assert!(CompositeKey::from_factor_name("value_composite_all").unwrap().is_all());
        // non-canonical order is rejected
        assert!(
            CompositeKey::from_factor_name("value_composite_sales_to_price_book_to_market")
                .is_err()
        );
        assert!(CompositeKey::from_factor_name("value_composite_foo").is_err());
    }

    #[test]
    fn test_definition_metadata() {
        let key = CompositeKey::new([ValueRatio::EarningsYield, ValueRatio::BookToMarket]).unwrap();
        let def = ValueComposite::new(key, ValueConfig::default()).definition();
        assert_eq!(def.name, "value_composite_book_to_market_earnings_yield");
        assert_eq!(
            def.parameters_json().unwrap(),
            r#"{"components":["book_to_market","earnings_yield"]}"#
        );
        assert_eq!(def.formula, "mean(z-subfactors)");
        assert_eq!(def.tags_joined(), "value,composite");
    }

    #[test]
    fn test_composite_is_mean_of_available_zscores() {
        let key = CompositeKey::new([ValueRatio::EarningsYield, ValueRatio::BookToMarket]).unwrap();
        let factor = ValueComposite::new(key, ValueConfig::default());
        let frame = factor.compute(&history()).unwrap();

        assert_eq!(frame.len(), 3);
        let value = |sid| {
            frame
                .rows()
                .iter()
                .find(|r| r.security_id == sid)
                .map(|r| r.raw_value)
                .unwrap()
        };

        let ey = 1.5_f64.sqrt();
        // earnings yield z: -ey, 0, ey; book to market z: 1, -1, absent
        assert_abs_diff_eq!(value(1), (-ey + 1.0) / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(value(2), (0.0 - 1.0) / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(value(3), ey, epsilon = 1e-12);
    }

    #[test]
    fn test_composite_without_any_component_is_error() {
        let history = InMemoryHistory::from_series(
            PriceColumn::AdjClose,
            vec![(1, vec![(d(1), 10.0)])],
        );
        let factor = ValueComposite::new(CompositeKey::all(), ValueConfig::default());
        assert!(factor.compute(&history).is_err());
    }
}
