//! Momentum factors based on historical price returns.
//!
//! A momentum factor measures the return over a lookback window that ends
//! `skip` periods before the computation date. Windows are given in months
//! (21 trading periods each) or in raw trading periods:
//! - `momentum_1m_skip_1m`: 1-month momentum skipping the most recent month
//! - `momentum_12m_skip_1m`: 12-month momentum skipping the most recent month
//!
//! Values before a security has enough history are undefined and omitted.

mod factor;
mod math;

pub use factor::{MomentumConfig, MomentumFactor, PeriodUnit, TRADING_DAYS_PER_MONTH};
pub use math::momentum_series;
