#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # ronda
//!
//! Factor computation and target-weight construction for equity universes.
//!
//! ronda is an umbrella crate that re-exports the ronda sub-crates and adds
//! the [`FactorPipeline`] that chains them.
//!
//! ## Quick Start
//!
//! ```
//! use ronda::prelude::*;
//! use ronda::factors::{FactorOptions, build_factor};
//!
//! # fn main() -> ronda::Result<()> {
//! let day = |n| Date::from_ymd_opt(2024, 1, n).unwrap();
//! let history = InMemoryHistory::from_series(
//!     PriceColumn::AdjClose,
//!     [
//!         (1, vec![(day(2), 100.0), (day(3), 110.0), (day(4), 121.0)]),
//!         (2, vec![(day(2), 100.0), (day(3), 95.0), (day(4), 90.25)]),
//!     ],
//! );
//!
//! let factor = build_factor("momentum_1p_skip_0p", &FactorOptions::default())?;
//! let pipeline = FactorPipeline::new(&history, &history, NormalizeConfig::default())?;
//! let run = pipeline.run_factor(factor.as_ref(), &CalcRunId::generate())?;
//! assert_eq!(run.values.len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types and traits ([`Factor`], [`HistoryAccess`], [`FactorStore`], ...)
//! - [`factors`] - Momentum and value factor math
//! - [`combine`] - Combination of z-scored sub-factors
//! - [`normalize`] - Cross-sectional winsorization, z-scores and ranks
//! - [`store`] - SQLite warehouse and factor store
//! - [`weights`] - Target-weight matrices for the portfolio simulator
//!
//! ## Architecture
//!
//! 1. **Factors** compute raw values per security from that security's history
//! 2. **Normalization** makes each date's values comparable across securities and sectors
//! 3. **The store** keeps definitions and values, tagged with the run that wrote them
//! 4. **The weight builder** turns stored or fresh scores into rebalanced target weights

pub mod pipeline;

/// Version information for the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core types and traits.
pub mod traits {
    pub use ronda_traits::*;
}

/// Factor implementations and the factor catalog.
pub mod factors {
    pub use ronda_factors::*;
}

/// Sub-factor combination.
pub mod combine {
    pub use ronda_combine::*;
}

/// Cross-sectional normalization.
pub mod normalize {
    pub use ronda_normalize::*;
}

/// SQLite warehouse.
pub mod store {
    pub use ronda_store::*;
}

/// Target-weight construction.
pub mod weights {
    pub use ronda_weights::*;
}

pub use pipeline::{FactorPipeline, FactorRun, PipelineConfig, load_score_panel};
pub use ronda_normalize::{CrossSectionalNormalizer, NormalizeConfig};
pub use ronda_traits::{
    CalcRunId, Factor, FactorStore, HistoryAccess, Result, RondaError, SectorReference,
};
pub use ronda_weights::{ScorePanel, TargetWeightMatrix, WeightBuilder, WeightConfig};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::pipeline::{FactorPipeline, FactorRun, PipelineConfig, load_score_panel};
    pub use ronda_normalize::{CrossSectionalNormalizer, NormalizeConfig};
    pub use ronda_traits::{
        CalcRunId, Date, DateRange, Factor, FactorDefinition, FactorStore, HistoryAccess,
        InMemoryHistory, PriceColumn, Result, RondaError, ScoredValue, SectorReference,
    };
    pub use ronda_weights::{
        RebalanceFrequency, ScoreColumn, ScorePanel, SelectionSize, Strategy, TargetWeightMatrix,
        WeightBuilder, WeightConfig, WeightingScheme,
    };
}
