//! `compute` and `pipeline` commands.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::*;
use ronda::traits::frame::scored_to_dataframe;
use ronda::traits::{Date, DateRange};
use ronda::{CalcRunId, FactorPipeline, FactorRun};

use crate::cmd::open_database;
use crate::config::AppConfig;

/// Run the configured factors, persisting them when the pipeline config says so.
///
/// With `output_dir`, each factor's normalized values are also written to
/// `<output_dir>/<factor>.csv`.
pub(crate) fn run(
    config: &AppConfig,
    run_id: Option<String>,
    start: Option<Date>,
    end: Option<Date>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let run = match run_id {
        Some(id) => CalcRunId::new(id)?,
        None => CalcRunId::generate(),
    };
    let range = DateRange::new(start.or(config.pipeline.start), end.or(config.pipeline.end))?;
    let factors = config.pipeline.build_factors()?;

    let db = open_database(config)?;
    let history = db.history();
    let store = db.factor_store();
    let mut pipeline = FactorPipeline::new(&history, &history, config.normalize)?.with_range(range);
    if config.pipeline.persist {
        pipeline = pipeline.with_store(&store);
    }

    let runs = pipeline
        .run(&factors, &run)
        .with_context(|| format!("run {run}"))?;
    print_runs(&run, &runs);
    if let Some(dir) = output_dir {
        for path in export_runs(dir, &runs)? {
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Write one CSV of normalized values per factor run.
fn export_runs(dir: &Path, runs: &[FactorRun]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    runs.iter()
        .map(|r| -> Result<PathBuf> {
            let path = dir.join(format!("{}.csv", r.definition.name));
            let mut df = scored_to_dataframe(&r.values)?;
            let mut file =
                File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
            Ok(path)
        })
        .collect()
}

fn print_runs(run: &CalcRunId, runs: &[FactorRun]) {
    println!("\nRun {run}");
    println!("{}", "-".repeat(78));
    println!(
        "{:<36} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "factor", "id", "dates", "rows", "inserted", "updated"
    );
    for r in runs {
        let dates: BTreeSet<Date> = r.values.iter().map(|v| v.trade_date).collect();
        let id = r.factor_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let (inserted, updated) = r.summary.map_or_else(
            || ("-".to_string(), "-".to_string()),
            |s| (s.inserted.to_string(), s.updated.to_string()),
        );
        println!(
            "{:<36} {:>8} {:>8} {:>8} {:>8} {:>8}",
            r.definition.name,
            id,
            dates.len(),
            r.values.len(),
            inserted,
            updated
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda::traits::{FactorCategory, FactorDefinition, ScoredValue};

    #[test]
    fn test_export_runs_writes_one_file_per_factor() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scores");
        let trade_date = Date::from_ymd_opt(2024, 3, 1).unwrap();
        let runs = vec![FactorRun {
            definition: FactorDefinition::new("earnings_yield", FactorCategory::Value),
            factor_id: None,
            values: vec![ScoredValue {
                security_id: 7,
                trade_date,
                raw_value: 0.05,
                market_zscore: 0.0,
                market_rank_pct: 0.5,
                sector_zscore: None,
                sector_rank_pct: None,
            }],
            summary: None,
        }];

        let paths = export_runs(&out, &runs).unwrap();
        assert_eq!(paths, vec![out.join("earnings_yield.csv")]);
        let text = std::fs::read_to_string(&paths[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "security_id,trade_date,raw_value,market_zscore,market_rank_pct,sector_zscore,sector_rank_pct"
            )
        );
        assert!(lines.next().unwrap().starts_with("7,2024-03-01,0.05,"));
    }
}
