//! Connection pool over the warehouse file.

use std::time::Duration;

use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use ronda_traits::{Date, Result, RondaError};
use rusqlite::{Connection, Row, types::Type};
use tracing::info;

use crate::config::StoreConfig;
use crate::factor_store::SqliteFactorStore;
use crate::history::SqliteHistory;
use crate::schema::SCHEMA;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Pooled handle on the SQLite warehouse.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    batch_size: usize,
}

impl Database {
    /// Open (creating if needed) the database file named by `config`.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] for an invalid config;
    /// [`RondaError::Storage`] when the pool cannot be built.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let manager = SqliteConnectionManager::file(&config.path).with_init(configure);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .build(manager)
            .map_err(RondaError::storage)?;

        info!(path = %config.path.display(), pool_size = config.pool_size, "opened warehouse");
        Ok(Self {
            pool,
            batch_size: config.batch_size,
        })
    }

    /// Private in-memory database.
    ///
    /// The pool holds a single connection that is never recycled, since
    /// every new in-memory connection is a fresh empty database.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(configure);
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)
            .map_err(RondaError::storage)?;

        Ok(Self {
            pool,
            batch_size: StoreConfig::default().batch_size,
        })
    }

    /// Override the upsert batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Create all tables and indexes that do not exist yet.
    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA).map_err(RondaError::storage)?;
        Ok(())
    }

    /// Factor store view of this database.
    pub fn factor_store(&self) -> SqliteFactorStore {
        SqliteFactorStore::new(self.clone())
    }

    /// History view of this database.
    pub fn history(&self) -> SqliteHistory {
        SqliteHistory::new(self.clone())
    }

    pub(crate) const fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub(crate) fn connection(&self) -> Result<PooledConn> {
        self.pool.get().map_err(RondaError::storage)
    }
}

fn configure(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update(None, "foreign_keys", true)
}

pub(crate) fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn read_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Date> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
