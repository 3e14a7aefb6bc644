//! Weight builder configuration.
//!
//! A [`WeightConfig`] picks exactly one [`Strategy`], a [`WeightingScheme`]
//! used on every side of that strategy, the [`RankDirection`] of the input
//! column and the [`RebalanceFrequency`] at which weights are realized.

use std::fmt;
use std::str::FromStr;

use ronda_traits::{FactorValue, Result, RondaError, ScoredValue};
use serde::{Deserialize, Serialize};

use crate::calendar::RebalanceFrequency;

/// How selected names share a side's exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingScheme {
    /// `1 / n_selected` of the side's exposure each.
    #[default]
    Equal,
    /// Proportional to `|score|` among the side's selected names.
    Score,
}

impl FromStr for WeightingScheme {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "score" | "factor" | "proportional" => Ok(Self::Score),
            _ => Err(RondaError::UnknownOption {
                kind: "weighting scheme",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WeightingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equal => "equal",
            Self::Score => "score",
        })
    }
}

/// Which end of the input column is best.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    /// Larger scores are better.
    #[default]
    HigherIsBetter,
    /// The input is a rank; 1 is best.
    LowerIsBetter,
}

/// Number of names selected on one side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSize {
    /// At most this many names.
    Count(usize),
    /// `ceil(fraction * candidates)` names, at least one.
    Fraction(f64),
}

impl SelectionSize {
    /// Number of names to take from `candidates` available ones.
    ///
    /// The size is a ceiling: fewer candidates select all of them.
    pub fn resolve(&self, candidates: usize) -> usize {
        if candidates == 0 {
            return 0;
        }
        let wanted = match *self {
            Self::Count(n) => n,
            Self::Fraction(f) => ((f * candidates as f64).ceil() as usize).max(1),
        };
        wanted.min(candidates)
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Self::Count(0) => Err(RondaError::invalid_parameter("size", "count must be at least 1")),
            Self::Fraction(f) if !(f > 0.0 && f <= 1.0) => Err(RondaError::invalid_parameter(
                "size",
                format!("fraction must lie in (0, 1], got {f}"),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for SelectionSize {
    fn default() -> Self {
        Self::Count(20)
    }
}

/// Selection rule; exactly one per build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Long-only: the best `size` names share a gross exposure of 1.
    TopN {
        /// Names selected.
        size: SelectionSize,
    },
    /// Best `size` names long, worst `size` of the rest short.
    LongShort {
        /// Names selected per side.
        size: SelectionSize,
    },
    /// Every name strictly above `upper` long, every name strictly below `lower` short.
    Threshold {
        /// Long threshold.
        upper: f64,
        /// Short threshold.
        lower: f64,
    },
}

impl Default for Strategy {
    fn default() -> Self {
        Self::TopN {
            size: SelectionSize::default(),
        }
    }
}

impl Strategy {
    /// Short name of the strategy.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TopN { .. } => "top_n",
            Self::LongShort { .. } => "long_short",
            Self::Threshold { .. } => "threshold",
        }
    }
}

/// Stored column that feeds the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreColumn {
    /// Raw factor value.
    Raw,
    /// Market-wide z-score.
    #[default]
    MarketZscore,
    /// Market-wide percentile rank.
    MarketRank,
    /// Sector z-score.
    SectorZscore,
    /// Sector percentile rank.
    SectorRank,
}

impl ScoreColumn {
    /// Value of this column in a stored row.
    pub const fn of_stored(&self, value: &FactorValue) -> Option<f64> {
        match self {
            Self::Raw => Some(value.raw_value),
            Self::MarketZscore => value.market_zscore,
            Self::MarketRank => value.market_rank_pct,
            Self::SectorZscore => value.sector_zscore,
            Self::SectorRank => value.sector_rank_pct,
        }
    }

    /// Value of this column in a freshly normalized row.
    pub const fn of_scored(&self, value: &ScoredValue) -> Option<f64> {
        match self {
            Self::Raw => Some(value.raw_value),
            Self::MarketZscore => Some(value.market_zscore),
            Self::MarketRank => Some(value.market_rank_pct),
            Self::SectorZscore => value.sector_zscore,
            Self::SectorRank => value.sector_rank_pct,
        }
    }

    /// Storage name of the column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw_value",
            Self::MarketZscore => "market_zscore",
            Self::MarketRank => "market_rank_pct",
            Self::SectorZscore => "sector_zscore",
            Self::SectorRank => "sector_rank_pct",
        }
    }
}

impl FromStr for ScoreColumn {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" | "raw_value" => Ok(Self::Raw),
            "market_zscore" | "zscore" => Ok(Self::MarketZscore),
            "market_rank" | "market_rank_pct" | "rank" => Ok(Self::MarketRank),
            "sector_zscore" => Ok(Self::SectorZscore),
            "sector_rank" | "sector_rank_pct" => Ok(Self::SectorRank),
            other => Err(RondaError::UnknownOption {
                kind: "score column",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ScoreColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight builder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Selection rule.
    pub strategy: Strategy,
    /// Weighting of selected names.
    pub weighting: WeightingScheme,
    /// Ordering of the input column.
    pub direction: RankDirection,
    /// Rebalance calendar.
    pub frequency: RebalanceFrequency,
    /// Long-side exposure of long-short and threshold strategies.
    pub long_exposure: f64,
    /// Short-side exposure (as a positive number) of long-short and threshold strategies.
    pub short_exposure: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            weighting: WeightingScheme::Equal,
            direction: RankDirection::HigherIsBetter,
            frequency: RebalanceFrequency::Monthly,
            long_exposure: 0.5,
            short_exposure: 0.5,
        }
    }
}

impl WeightConfig {
    /// Default configuration with `strategy`.
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Validate every parameter.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] naming `size`, `threshold`,
    /// `weighting`, `long_exposure` or `short_exposure`. Score weighting
    /// of a lower-is-better column is rejected, since `|score|` would give
    /// the worst selected rank the largest weight.
    pub fn validate(&self) -> Result<()> {
        match self.strategy {
            Strategy::TopN { size } | Strategy::LongShort { size } => size.validate()?,
            Strategy::Threshold { upper, lower } => {
                if !upper.is_finite() || !lower.is_finite() || lower > upper {
                    return Err(RondaError::invalid_parameter(
                        "threshold",
                        format!("need finite lower <= upper, got lower {lower}, upper {upper}"),
                    ));
                }
            }
        }
        if self.weighting == WeightingScheme::Score
            && self.direction == RankDirection::LowerIsBetter
        {
            return Err(RondaError::invalid_parameter(
                "weighting",
                "score weighting needs a higher-is-better column; use equal weighting for ranks",
            ));
        }
        for (name, exposure) in [
            ("long_exposure", self.long_exposure),
            ("short_exposure", self.short_exposure),
        ] {
            if !exposure.is_finite() || exposure < 0.0 {
                return Err(RondaError::invalid_parameter(
                    name,
                    format!("must be finite and non-negative, got {exposure}"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_size_resolve() {
        assert_eq!(SelectionSize::Count(5).resolve(3), 3);
        assert_eq!(SelectionSize::Count(2).resolve(10), 2);
        assert_eq!(SelectionSize::Fraction(0.1).resolve(25), 3);
        assert_eq!(SelectionSize::Fraction(0.1).resolve(4), 1);
        assert_eq!(SelectionSize::Fraction(0.5).resolve(0), 0);
    }

    #[test]
    fn test_weighting_scheme_parse() {
        assert_eq!("equal".parse::<WeightingScheme>().unwrap(), WeightingScheme::Equal);
        assert_eq!("factor".parse::<WeightingScheme>().unwrap(), WeightingScheme::Score);
        assert!(matches!(
            "magic".parse::<WeightingScheme>().unwrap_err(),
            RondaError::UnknownOption { kind: "weighting scheme", .. }
        ));
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let zero = WeightConfig::with_strategy(Strategy::TopN {
            size: SelectionSize::Count(0),
        });
        assert!(zero.validate().is_err());

        let inverted = WeightConfig::with_strategy(Strategy::Threshold {
            upper: -1.0,
            lower: 1.0,
        });
        assert!(matches!(
            inverted.validate().unwrap_err(),
            RondaError::InvalidParameter { ref name, .. } if name == "threshold"
        ));

        let negative = WeightConfig {
            short_exposure: -0.5,
            ..WeightConfig::default()
        };
        assert!(negative.validate().is_err());
        assert!(WeightConfig::default().validate().is_ok());
    }

    #[test]
    fn test_score_weighting_of_ranks_rejected() {
        let ranks = WeightConfig {
            weighting: WeightingScheme::Score,
            direction: RankDirection::LowerIsBetter,
            ..WeightConfig::default()
        };
        assert!(matches!(
            ranks.validate().unwrap_err(),
            RondaError::InvalidParameter { ref name, .. } if name == "weighting"
        ));

        let equal_ranks = WeightConfig {
            direction: RankDirection::LowerIsBetter,
            ..WeightConfig::default()
        };
        assert!(equal_ranks.validate().is_ok());
    }

    #[test]
    fn test_score_column_parse() {
        assert_eq!("sector_rank".parse::<ScoreColumn>().unwrap(), ScoreColumn::SectorRank);
        assert!("beta".parse::<ScoreColumn>().is_err());
    }
}
