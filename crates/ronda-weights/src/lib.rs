//! Target-weight construction for ronda.
//!
//! Converts per-date factor scores into a date × security target-weight
//! matrix for a portfolio simulator:
//! - Strategies: top-N long-only, long-short, threshold
//! - Weighting: equal or proportional to `|score|`
//! - Rebalance calendars: daily, weekly, monthly, quarterly, with weights
//!   carried forward between rebalance dates
//!
//! # Example
//!
//! ```
//! use ronda_traits::Date;
//! use ronda_weights::{RebalanceFrequency, ScorePanel, SelectionSize, Strategy, WeightBuilder, WeightConfig};
//!
//! let day = Date::from_ymd_opt(2024, 1, 31).unwrap();
//! let panel = ScorePanel::from_triples([(1, day, 2.0), (2, day, 1.0), (3, day, 0.0)]).unwrap();
//!
//! let config = WeightConfig {
//!     frequency: RebalanceFrequency::Monthly,
//!     ..WeightConfig::with_strategy(Strategy::TopN { size: SelectionSize::Count(1) })
//! };
//! let weights = WeightBuilder::new(config).unwrap().build(&panel).unwrap();
//! assert_eq!(weights.weight(day, 1), Some(1.0));
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod builder;
pub mod calendar;
pub mod config;
pub mod matrix;
pub mod panel;

pub use builder::WeightBuilder;
pub use calendar::{RebalanceFrequency, rebalance_dates};
pub use config::{RankDirection, ScoreColumn, SelectionSize, Strategy, WeightConfig, WeightingScheme};
pub use matrix::{PriceMatrix, SimulationInput, TargetWeightMatrix};
pub use panel::ScorePanel;
