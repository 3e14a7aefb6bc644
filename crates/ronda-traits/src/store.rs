//! Factor store abstraction.
//!
//! A factor store registers [`FactorDefinition`]s idempotently by name and
//! upserts per-(security, date, factor) rows tagged with a [`CalcRunId`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::factor::{FactorDefinition, RegisteredFactor};
use crate::types::{Date, DateRange, FactorId, SecurityId};
use crate::{Result, RondaError};

/// Identifier of one computation run, stored with every written row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalcRunId(String);

impl CalcRunId {
    /// Wrap a caller-supplied run id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RondaError::invalid_parameter(
                "calc_run_id",
                "must not be empty",
            ));
        }
        Ok(Self(id))
    }

    /// Run id derived from the current UTC time, `run_YYYYMMDD_HHMMSS`.
    pub fn generate() -> Self {
        Self::at(Utc::now())
    }

    /// Run id derived from the given time.
    pub fn at(time: DateTime<Utc>) -> Self {
        Self(format!("run_{}", time.format("%Y%m%d_%H%M%S")))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CalcRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalized factor value ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredValue {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Computation date.
    pub trade_date: Date,
    /// Value the scores were computed from.
    pub raw_value: f64,
    /// Market-wide z-score on the date.
    pub market_zscore: f64,
    /// Market-wide percentile rank on the date, in `(0, 1]`.
    pub market_rank_pct: f64,
    /// Z-score within the security's sector; `None` without a sector label.
    pub sector_zscore: Option<f64>,
    /// Percentile rank within the security's sector; `None` without a sector label.
    pub sector_rank_pct: Option<f64>,
}

/// A stored factor value row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorValue {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Computation date.
    pub trade_date: Date,
    /// Factor identifier.
    pub factor_id: FactorId,
    /// Stored value.
    pub raw_value: f64,
    /// Market-wide z-score.
    pub market_zscore: Option<f64>,
    /// Market-wide percentile rank.
    pub market_rank_pct: Option<f64>,
    /// Sector z-score.
    pub sector_zscore: Option<f64>,
    /// Sector percentile rank.
    pub sector_rank_pct: Option<f64>,
    /// Run that last wrote the row.
    pub calc_run_id: CalcRunId,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one upsert call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
    /// Rows that did not exist before the call.
    pub inserted: usize,
    /// Rows that were overwritten.
    pub updated: usize,
}

impl UpsertSummary {
    /// Total rows written.
    pub const fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Versioned storage of factor definitions and values.
///
/// Implementations must make every call atomic: a failure leaves the store in
/// its state before the call.
pub trait FactorStore: Send + Sync {
    /// Register `definition`, returning its factor id.
    ///
    /// Registering an existing name returns the existing id unchanged and
    /// writes nothing.
    ///
    /// # Errors
    ///
    /// [`RondaError::DefinitionConflict`] when the name exists with different
    /// parameters or version; [`RondaError::Storage`] on backend failure.
    fn register(&self, definition: &FactorDefinition) -> Result<FactorId>;

    /// Insert or overwrite the rows keyed by `(security_id, trade_date, factor_id)`.
    ///
    /// All rows of one call are written or none are.
    fn upsert_values(
        &self,
        factor_id: FactorId,
        rows: &[ScoredValue],
        run: &CalcRunId,
    ) -> Result<UpsertSummary>;

    /// Look up a definition by name.
    fn definition(&self, name: &str) -> Result<Option<RegisteredFactor>>;

    /// All definitions ordered by category and name.
    fn list_definitions(&self, active_only: bool) -> Result<Vec<RegisteredFactor>>;

    /// Stored values of one factor inside `range`, ordered by date then security.
    fn load_values(&self, factor_id: FactorId, range: &DateRange) -> Result<Vec<FactorValue>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_calc_run_id_format() {
        let time = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(CalcRunId::at(time).as_str(), "run_20240506_070809");
    }

    #[test]
    fn test_calc_run_id_rejects_empty() {
        assert!(CalcRunId::new("  ").is_err());
        assert_eq!(CalcRunId::new("pipeline_x").unwrap().to_string(), "pipeline_x");
    }

    #[test]
    fn test_upsert_summary_total() {
        let summary = UpsertSummary {
            inserted: 3,
            updated: 2,
        };
        assert_eq!(summary.total(), 5);
    }
}
