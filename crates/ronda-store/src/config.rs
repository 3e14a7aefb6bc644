//! Store configuration.

use std::path::PathBuf;

use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};

/// Configuration of the SQLite warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file.
    pub path: PathBuf,

    /// Maximum pooled connections.
    pub pool_size: u32,

    /// Rows written per statement batch inside one upsert transaction.
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ronda.db"),
            pool_size: 4,
            batch_size: 500,
        }
    }
}

impl StoreConfig {
    /// Default configuration pointing at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Check pool and batch sizes.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] naming `pool_size` or `batch_size`
    /// when either is zero.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(RondaError::invalid_parameter("pool_size", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(RondaError::invalid_parameter("batch_size", "must be at least 1"));
        }
        Ok(())
    }
}
