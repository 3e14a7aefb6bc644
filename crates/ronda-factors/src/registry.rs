//! Factor catalog for discovering and building factors by name.
//!
//! Factor names are stable registration keys, so every factor can be rebuilt
//! from its name alone:
//! - `momentum_{L}m_skip_{S}m` / `momentum_{L}p_skip_{S}p`
//! - the five value sub-factor names, e.g. `earnings_yield`
//! - `value_composite_all` or `value_composite_<sorted components>`

use ronda_traits::{Factor, FactorCategory, PriceColumn, Result, RondaError, SecurityId};
use serde::{Deserialize, Serialize};

use crate::momentum::{MomentumConfig, MomentumFactor, PeriodUnit};
use crate::value::{CompositeKey, ValueComposite, ValueConfig, ValueRatio, ValueRatioFactor};

/// Momentum lookbacks, in months, of the default factor set.
pub const DEFAULT_MOMENTUM_LOOKBACKS: [i64; 5] = [1, 3, 6, 9, 12];

/// Momentum skip, in months, of the default factor set.
pub const DEFAULT_MOMENTUM_SKIP: i64 = 1;

/// Options applied to every factor built from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorOptions {
    /// Price field for momentum and the value date index.
    pub price_column: PriceColumn,
    /// Securities dropped before value factors are computed.
    pub exclude_securities: Vec<SecurityId>,
    /// Compute securities on the rayon pool.
    pub parallel: bool,
}

impl Default for FactorOptions {
    fn default() -> Self {
        Self {
            price_column: PriceColumn::AdjClose,
            exclude_securities: Vec::new(),
            parallel: true,
        }
    }
}

impl FactorOptions {
    fn value_config(&self) -> ValueConfig {
        ValueConfig {
            price_column: self.price_column,
            exclude_securities: self.exclude_securities.clone(),
            parallel: self.parallel,
        }
    }

    fn momentum_config(&self, lookback: i64, skip: i64, unit: PeriodUnit) -> MomentumConfig {
        MomentumConfig {
            lookback,
            skip,
            unit,
            price_column: self.price_column,
            parallel: self.parallel,
        }
    }
}

/// Metadata about a catalog factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorInfo {
    /// Unique factor name
    pub name: String,

    /// Category classification
    pub category: FactorCategory,

    /// Human-readable description
    pub description: String,

    /// Trading periods of history needed before the first value
    pub typical_lookback: usize,

    /// Whether the factor requires fundamental data
    pub requires_fundamentals: bool,
}

impl FactorInfo {
    fn of(factor: &dyn Factor) -> Self {
        let definition = factor.definition();
        Self {
            name: definition.name,
            category: definition.category,
            description: definition.description,
            typical_lookback: factor.lookback(),
            requires_fundamentals: definition.category == FactorCategory::Value,
        }
    }
}

/// Build the factor registered under `name`.
///
/// # Errors
///
/// [`RondaError::UnknownFactor`] when the name matches no catalog pattern;
/// [`RondaError::InvalidParameter`] when a momentum name carries an invalid window.
///
/// # Example
///
/// ```
/// use ronda_factors::registry::{FactorOptions, build_factor};
/// use ronda_traits::Factor;
///
/// let factor = build_factor("momentum_6m_skip_1m", &FactorOptions::default()).unwrap();
/// assert_eq!(factor.lookback(), 147);
/// assert!(build_factor("quality_roe", &FactorOptions::default()).is_err());
/// ```
pub fn build_factor(name: &str, options: &FactorOptions) -> Result<Box<dyn Factor>> {
    if let Some((lookback, skip, unit)) = parse_momentum_name(name) {
        let config = options.momentum_config(lookback, skip, unit);
        return Ok(Box::new(MomentumFactor::new(config)?));
    }
    if name.starts_with("value_composite_") {
        let key = CompositeKey::from_factor_name(name)?;
        return Ok(Box::new(ValueComposite::new(key, options.value_config())));
    }
    let ratio: ValueRatio = name.parse()?;
    Ok(Box::new(ValueRatioFactor::new(ratio, options.value_config())))
}

/// Build several factors, failing on the first unknown name before any is computed.
pub fn build_factors<S: AsRef<str>>(
    names: &[S],
    options: &FactorOptions,
) -> Result<Vec<Box<dyn Factor>>> {
    names
        .iter()
        .map(|n| build_factor(n.as_ref(), options))
        .collect()
}

/// The default factor set: momentum at every default lookback, the value
/// composite of all sub-factors, and each value sub-factor on its own.
pub fn default_factor_set(options: &FactorOptions) -> Result<Vec<Box<dyn Factor>>> {
    let mut factors: Vec<Box<dyn Factor>> = Vec::new();
    for lookback in DEFAULT_MOMENTUM_LOOKBACKS {
        let config =
            options.momentum_config(lookback, DEFAULT_MOMENTUM_SKIP, PeriodUnit::default());
        factors.push(Box::new(MomentumFactor::new(config)?));
    }
    factors.push(Box::new(ValueComposite::new(
        CompositeKey::all(),
        options.value_config(),
    )));
    for ratio in ValueRatio::ALL {
        factors.push(Box::new(ValueRatioFactor::new(ratio, options.value_config())));
    }
    Ok(factors)
}

/// Get information about all catalog factors.
pub fn available_factors() -> Vec<FactorInfo> {
    default_factor_set(&FactorOptions::default())
        .map(|factors| factors.iter().map(|f| FactorInfo::of(f.as_ref())).collect())
        .unwrap_or_default()
}

/// Get all catalog factors in a specific category.
pub fn factors_by_category(category: FactorCategory) -> Vec<FactorInfo> {
    available_factors()
        .into_iter()
        .filter(|info| info.category == category)
        .collect()
}

/// Get information about any buildable factor by name.
pub fn get_factor_info(name: &str) -> Option<FactorInfo> {
    build_factor(name, &FactorOptions::default())
        .ok()
        .map(|f| FactorInfo::of(f.as_ref()))
}

fn parse_momentum_name(name: &str) -> Option<(i64, i64, PeriodUnit)> {
    let (lookback, skip) = name.strip_prefix("momentum_")?.split_once("_skip_")?;
    let unit_of = |part: &str| -> Option<(i64, PeriodUnit)> {
        if let Some(digits) = part.strip_suffix('m') {
            Some((digits.parse().ok()?, PeriodUnit::default()))
        } else if let Some(digits) = part.strip_suffix('p') {
            Some((digits.parse().ok()?, PeriodUnit::Periods))
        } else {
            None
        }
    };
    let (lookback, lookback_unit) = unit_of(lookback)?;
    let (skip, skip_unit) = unit_of(skip)?;
    (lookback_unit == skip_unit).then_some((lookback, skip, lookback_unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_factors() {
        let factors = available_factors();
        assert_eq!(factors.len(), 11);

        let momentum = factors_by_category(FactorCategory::Momentum);
        assert_eq!(momentum.len(), 5);
        assert!(momentum.iter().all(|f| !f.requires_fundamentals));

        let value = factors_by_category(FactorCategory::Value);
        assert_eq!(value.len(), 6);
        assert!(value.iter().any(|f| f.name == "value_composite_all"));
    }

    #[test]
    fn test_default_momentum_names() {
        let names: Vec<String> = factors_by_category(FactorCategory::Momentum)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "momentum_1m_skip_1m",
                "momentum_3m_skip_1m",
                "momentum_6m_skip_1m",
                "momentum_9m_skip_1m",
                "momentum_12m_skip_1m",
            ]
        );
    }

    #[test]
    fn test_build_by_name_round_trips() {
        let options = FactorOptions::default();
        for name in [
            "momentum_3m_skip_0m",
            "momentum_10p_skip_2p",
            "sales_to_price",
            "value_composite_all",
            "value_composite_book_to_market_earnings_yield",
        ] {
            assert_eq!(build_factor(name, &options).unwrap().name(), name);
        }
    }

    #[test]
    fn test_build_unknown_or_invalid() {
        let options = FactorOptions::default();
        assert!(matches!(
            build_factor("dividend_yield", &options).unwrap_err(),
            RondaError::UnknownFactor(_)
        ));
        assert!(matches!(
            build_factor("momentum_3m_skip_1p", &options).unwrap_err(),
            RondaError::UnknownFactor(_)
        ));
        assert!(matches!(
            build_factor("momentum_0m_skip_1m", &options).unwrap_err(),
            RondaError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn test_build_factors_fails_fast() {
        let options = FactorOptions::default();
        assert!(build_factors(&["earnings_yield", "nope"], &options).is_err());
        assert_eq!(
            build_factors(&["earnings_yield", "book_to_market"], &options)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_get_factor_info() {
        let info = get_factor_info("momentum_1m_skip_1m").unwrap();
        assert_eq!(info.category, FactorCategory::Momentum);
        assert_eq!(info.typical_lookback, 42);

        let value = get_factor_info("book_to_market").unwrap();
        assert!(value.requires_fundamentals);

        assert!(get_factor_info("nonexistent_factor").is_none());
    }
}
