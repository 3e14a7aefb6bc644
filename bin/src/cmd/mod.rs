//! CLI subcommand modules.

pub(crate) mod compute;
pub(crate) mod factors;
pub(crate) mod import;
pub(crate) mod init_db;
pub(crate) mod weights;

use anyhow::{Context, Result};
use ronda::store::Database;

use crate::config::AppConfig;

/// Open the configured warehouse and make sure its tables exist.
pub(crate) fn open_database(config: &AppConfig) -> Result<Database> {
    let db = Database::open(&config.database)
        .with_context(|| format!("opening {}", config.database.path.display()))?;
    db.initialize_schema().context("initializing schema")?;
    Ok(db)
}
