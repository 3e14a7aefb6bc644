//! Value factors based on fundamental valuation ratios.
//!
//! This module provides the valuation sub-factors that compare fundamental
//! metrics to price or firm value:
//! - Earnings yield: EPS relative to price
//! - Book-to-market: Book equity relative to market capitalization
//! - Free cash flow yield: Free cash flow relative to market capitalization
//! - Sales-to-price: Revenue relative to market capitalization
//! - Operating income yield: Operating income relative to enterprise value
//!
//! Fundamentals reach the daily price dates through a backward as-of join
//! per security. Each sub-factor can be computed on its own
//! ([`ValueRatioFactor`]) or combined into a [`ValueComposite`].

mod asof;
mod composite;
mod panel;
mod ratios;
mod single;

pub use asof::{DisclosureIndex, asof_backward};
pub use composite::{CompositeKey, ValueComposite};
pub use panel::ValueConfig;
pub use ratios::{Denominator, ValueRatio, safe_ratio};
pub use single::ValueRatioFactor;
