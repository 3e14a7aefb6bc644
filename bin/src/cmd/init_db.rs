//! `init-db` command.

use anyhow::Result;

use crate::cmd::open_database;
use crate::config::AppConfig;

/// Create the warehouse file and its tables.
pub(crate) fn run(config: &AppConfig) -> Result<()> {
    open_database(config)?;
    println!("Initialized {}", config.database.path.display());
    Ok(())
}
