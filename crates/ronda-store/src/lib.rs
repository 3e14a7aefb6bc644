//! SQLite warehouse for the ronda pipeline.
//!
//! One [`Database`] holds a connection pool over the warehouse tables
//! (`securities`, `prices`, `fundamentals`, `factor_definitions`,
//! `factor_values`) and hands out two views of it:
//! - [`SqliteFactorStore`], the [`FactorStore`](ronda_traits::FactorStore)
//!   implementation with idempotent registration and atomic upserts
//! - [`SqliteHistory`], the [`HistoryAccess`](ronda_traits::HistoryAccess)
//!   and [`SectorReference`](ronda_traits::SectorReference) implementation
//!   factor math reads from
//!
//! # Example
//!
//! ```
//! use ronda_store::Database;
//! use ronda_traits::{FactorCategory, FactorDefinition, FactorStore};
//!
//! let db = Database::in_memory().unwrap();
//! db.initialize_schema().unwrap();
//!
//! let store = db.factor_store();
//! let definition = FactorDefinition::new("earnings_yield", FactorCategory::Value);
//! let id = store.register(&definition).unwrap();
//! assert_eq!(store.register(&definition).unwrap(), id);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod database;
mod factor_store;
mod history;
mod schema;

pub use config::StoreConfig;
pub use database::Database;
pub use factor_store::SqliteFactorStore;
pub use history::{PriceBar, SecurityRecord, SqliteHistory};
