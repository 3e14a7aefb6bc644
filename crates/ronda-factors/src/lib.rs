//! Factor math for the ronda pipeline.
//!
//! This crate provides concrete [`Factor`](ronda_traits::Factor)
//! implementations:
//! - Momentum: price return over a lookback window, skipping recent periods
//! - Value: valuation ratios joined to daily prices with a backward as-of join
//! - Value composite: mean of per-date z-scored valuation ratios
//!
//! Each factor computes one raw value per (security, date) from that
//! security's own history. Securities are independent partitions and are
//! processed in parallel; cross-sectional scoring happens downstream.
//!
//! # Example
//!
//! ```
//! use ronda_factors::registry::{FactorOptions, available_factors, build_factor};
//! use ronda_traits::Factor;
//!
//! // Build a factor by its registration name
//! let factor = build_factor("momentum_12m_skip_1m", &FactorOptions::default()).unwrap();
//!
//! // Discover the default catalog
//! let factors = available_factors();
//! assert!(factors.iter().any(|f| f.name == factor.name()));
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod momentum;
pub mod partition;
pub mod registry;
pub mod value;

// Re-export key types
pub use momentum::{MomentumConfig, MomentumFactor};
pub use registry::{FactorInfo, FactorOptions, build_factor, build_factors, default_factor_set};
pub use value::{CompositeKey, ValueComposite, ValueConfig, ValueRatio, ValueRatioFactor};
