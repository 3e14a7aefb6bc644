//! Cross-sectional normalization of raw factor values.
//!
//! Raw factor values are not comparable across securities until they are
//! scored against the other members of the same date. For every date this
//! crate optionally log-transforms and winsorizes the cross-section, then
//! computes market-wide and sector-relative z-scores and percentile ranks.
//!
//! # Examples
//!
//! ```rust
//! use ronda_normalize::{CrossSectionalNormalizer, NormalizeConfig};
//! use ronda_traits::{Date, FactorFrame, SectorMap};
//!
//! let date = Date::from_ymd_opt(2024, 3, 28).unwrap();
//! let mut frame = FactorFrame::new("momentum_12m_skip_1m");
//! frame.push(1, date, Some(0.10));
//! frame.push(2, date, Some(-0.05));
//! frame.push(3, date, Some(0.0));
//!
//! let normalizer = CrossSectionalNormalizer::new(NormalizeConfig::default()).unwrap();
//! let scored = normalizer.normalize(&frame, &SectorMap::new()).unwrap();
//! assert_eq!(scored.len(), 3);
//! assert_eq!(scored[0].market_rank_pct, 1.0);
//! ```

mod config;
mod normalizer;

pub use config::NormalizeConfig;
pub use normalizer::{CrossSectionalNormalizer, NEUTRAL_RANK};
