//! Factor trait and factor metadata.
//!
//! This module defines the `Factor` trait, the core abstraction for computing
//! raw per-(security, date) values from history, together with the
//! `FactorDefinition` metadata that is registered once per logical factor.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::history::HistoryAccess;
use crate::types::{FactorFrame, FactorId};
use crate::{Result, RondaError};

/// Factor category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    /// Price momentum factors
    Momentum,
    /// Valuation factors
    Value,
}

impl FactorCategory {
    /// Storage name of the category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Momentum => "momentum",
            Self::Value => "value",
        }
    }

    /// Get a human-readable description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Momentum => "Price momentum and trend-following factors",
            Self::Value => "Valuation ratios comparing fundamentals to price",
        }
    }
}

impl fmt::Display for FactorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FactorCategory {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "momentum" => Ok(Self::Momentum),
            "value" => Ok(Self::Value),
            other => Err(RondaError::UnknownOption {
                kind: "factor category",
                value: other.to_string(),
            }),
        }
    }
}

/// Metadata describing one logical factor.
///
/// A definition is registered once per unique `name`. Parameters are kept in
/// a sorted map so their JSON form is identical across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorDefinition {
    /// Unique factor name, e.g. `momentum_12m_skip_1m`.
    pub name: String,
    /// Category.
    pub category: FactorCategory,
    /// Parameter name to value.
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Human-readable description.
    pub description: String,
    /// Formula version.
    pub version: u32,
    /// Formula text, e.g. `momentum = P[t-skip] / P[t-skip-lookback] - 1`.
    pub formula: String,
    /// Input source, e.g. `prices` or `fundamentals + prices`.
    pub source: String,
    /// Whether the factor is active.
    pub is_active: bool,
    /// Free-form tags.
    pub tags: Vec<String>,
}

impl FactorDefinition {
    /// Definition with version 1, active, and no parameters or tags.
    pub fn new(name: impl Into<String>, category: FactorCategory) -> Self {
        Self {
            name: name.into(),
            category,
            parameters: BTreeMap::new(),
            description: String::new(),
            version: 1,
            formula: String::new(),
            source: String::new(),
            is_active: true,
            tags: Vec::new(),
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the formula text.
    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = formula.into();
        self
    }

    /// Set the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Canonical JSON of the parameters (keys sorted).
    pub fn parameters_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.parameters)?)
    }

    /// Tags joined with commas.
    pub fn tags_joined(&self) -> String {
        self.tags.join(",")
    }
}

/// A definition together with its stable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredFactor {
    /// Identifier assigned on first registration.
    pub factor_id: FactorId,
    /// Stored metadata.
    pub definition: FactorDefinition,
}

/// A factor that computes raw values from security history.
///
/// Implementations compute one value per (security, date) from that
/// security's own history, using nothing dated after the computation date.
/// They must be thread-safe (`Send + Sync`) so factors can be computed in
/// parallel.
///
/// # Example
///
/// ```no_run
/// use ronda_traits::{Factor, FactorCategory, FactorDefinition, FactorFrame, HistoryAccess, Result};
///
/// #[derive(Debug)]
/// struct Constant;
///
/// impl Factor for Constant {
///     fn name(&self) -> &str {
///         "constant"
///     }
///
///     fn definition(&self) -> FactorDefinition {
///         FactorDefinition::new("constant", FactorCategory::Momentum)
///     }
///
///     fn compute(&self, _history: &dyn HistoryAccess) -> Result<FactorFrame> {
///         Ok(FactorFrame::new("constant"))
///     }
///
///     fn lookback(&self) -> usize {
///         0
///     }
/// }
/// ```
pub trait Factor: Send + Sync + fmt::Debug {
    /// Returns the unique name of this factor.
    ///
    /// The name is the registration key in the factor store, so it must be
    /// identical across runs for the same parameters.
    fn name(&self) -> &str;

    /// Returns the metadata registered for this factor.
    fn definition(&self) -> FactorDefinition;

    /// Computes raw values for every (security, date) where the factor is defined.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - History access fails or a required column is missing
    /// - No usable history remains after cleaning
    /// - Every computed value is undefined
    fn compute(&self, history: &dyn HistoryAccess) -> Result<FactorFrame>;

    /// Returns the number of periods of history needed before the first value.
    fn lookback(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_json_is_sorted() {
        let def = FactorDefinition::new("f", FactorCategory::Value)
            .with_parameter("zeta", 1)
            .with_parameter("alpha", "x");
        assert_eq!(def.parameters_json().unwrap(), r#"{"alpha":"x","zeta":1}"#);
    }

    #[test]
    fn test_builder_defaults() {
        let def = FactorDefinition::new("f", FactorCategory::Momentum)
            .with_tags(&["momentum", "price"])
            .with_formula("p1/p0 - 1");
        assert_eq!(def.version, 1);
        assert!(def.is_active);
        assert_eq!(def.tags_joined(), "momentum,price");
        assert_eq!(def.formula, "p1/p0 - 1");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("value".parse::<FactorCategory>().unwrap(), FactorCategory::Value);
        assert_eq!(FactorCategory::Momentum.to_string(), "momentum");
        assert!("quality".parse::<FactorCategory>().is_err());
    }

    #[test]
    fn test_factor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Factor>();
    }
}
