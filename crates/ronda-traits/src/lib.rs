#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and trait definitions for the ronda factor pipeline.
//!
//! This crate provides the data model shared by every pipeline stage
//! (price series, fundamentals, factor definitions and values), the
//! collaborator traits ([`HistoryAccess`], [`SectorReference`],
//! [`FactorStore`]) and the [`Factor`] abstraction implemented by the factor
//! math crate.

/// The version of the ronda-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod factor;
pub mod frame;
pub mod history;
pub mod stats;
pub mod store;
pub mod types;

// Re-exports
pub use error::{Result, RondaError};
pub use factor::{Factor, FactorCategory, FactorDefinition, RegisteredFactor};
pub use history::{HistoryAccess, InMemoryHistory, SectorReference, partition_prices};
pub use store::{CalcRunId, FactorStore, FactorValue, ScoredValue, UpsertSummary};
pub use types::{
    Date, DateRange, FactorFrame, FactorId, FactorRow, FundamentalRecord, PriceColumn, PriceRow,
    PriceSeries, SectorMap, SecurityId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
