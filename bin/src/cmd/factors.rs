//! `factors` command.

use anyhow::Result;
use ronda::factors::registry::{available_factors, factors_by_category};
use ronda::traits::{FactorCategory, FactorStore};

use crate::cmd::open_database;
use crate::config::AppConfig;

/// List catalog factors, then the definitions registered in the warehouse.
pub(crate) fn run(config: &AppConfig, category: Option<&str>, verbose: bool) -> Result<()> {
    let catalog = match category {
        Some(name) => factors_by_category(name.parse::<FactorCategory>()?),
        None => available_factors(),
    };

    println!("\nCatalog factors:");
    println!("{}", "-".repeat(60));
    for info in &catalog {
        if verbose {
            println!(
                "  {:28} {:9} lookback {:>4}  {}",
                info.name,
                info.category.as_str(),
                info.typical_lookback,
                info.description
            );
        } else {
            println!("  {}", info.name);
        }
    }
    println!();

    if !config.database.path.exists() {
        println!("No warehouse at {}.\n", config.database.path.display());
        return Ok(());
    }

    let store = open_database(config)?.factor_store();
    let registered = store.list_definitions(false)?;
    println!("Registered factors:");
    println!("{}", "-".repeat(60));
    if registered.is_empty() {
        println!("  (none)");
    }
    for factor in registered {
        let definition = &factor.definition;
        if category.is_some_and(|c| c != definition.category.as_str()) {
            continue;
        }
        let status = if definition.is_active { "" } else { " (inactive)" };
        println!(
            "  [{:>3}] {} v{}{}",
            factor.factor_id, definition.name, definition.version, status
        );
        if verbose {
            println!("        {} | {}", definition.formula, definition.parameters_json()?);
        }
    }
    println!();
    Ok(())
}
