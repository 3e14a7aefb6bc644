//! [`FactorStore`] over the warehouse tables.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ronda_traits::{
    CalcRunId, DateRange, FactorCategory, FactorDefinition, FactorId, FactorStore, FactorValue,
    RegisteredFactor, Result, RondaError, ScoredValue, UpsertSummary,
};
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params, types::Type};
use tracing::{debug, info};

use crate::database::{Database, format_date, read_date};

const DEFINITION_COLUMNS: &str = "factor_id, name, category, params_json, description, version, \
     expression, source, is_active, tags";

/// SQLite-backed factor store.
#[derive(Debug, Clone)]
pub struct SqliteFactorStore {
    db: Database,
}

impl SqliteFactorStore {
    pub(crate) const fn new(db: Database) -> Self {
        Self { db }
    }
}

impl FactorStore for SqliteFactorStore {
    fn register(&self, definition: &FactorDefinition) -> Result<FactorId> {
        let params_json = definition.parameters_json()?;
        let mut conn = self.db.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RondaError::storage)?;

        let existing = tx
            .query_row(
                "SELECT factor_id, params_json, version FROM factor_definitions WHERE name = ?1",
                params![definition.name],
                |row| {
                    Ok((
                        row.get::<_, FactorId>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u32>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(RondaError::storage)?;

        if let Some((factor_id, stored_params, stored_version)) = existing {
            let stored: BTreeMap<String, serde_json::Value> = serde_json::from_str(&stored_params)?;
            if stored != definition.parameters {
                return Err(RondaError::DefinitionConflict {
                    name: definition.name.clone(),
                    field: "parameters",
                    existing: stored_params,
                    requested: params_json,
                });
            }
            if stored_version != definition.version {
                return Err(RondaError::DefinitionConflict {
                    name: definition.name.clone(),
                    field: "version",
                    existing: stored_version.to_string(),
                    requested: definition.version.to_string(),
                });
            }
            debug!(name = %definition.name, factor_id, "factor already registered");
            return Ok(factor_id);
        }

        tx.execute(
            "INSERT INTO factor_definitions
                (name, category, params_json, description, version, expression, source, is_active, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                definition.name,
                definition.category.as_str(),
                params_json,
                definition.description,
                definition.version,
                definition.formula,
                definition.source,
                definition.is_active,
                definition.tags_joined(),
            ],
        )
        .map_err(RondaError::storage)?;
        let factor_id = tx.last_insert_rowid();
        tx.commit().map_err(RondaError::storage)?;

        info!(name = %definition.name, factor_id, "registered factor");
        Ok(factor_id)
    }

    fn upsert_values(
        &self,
        factor_id: FactorId,
        rows: &[ScoredValue],
        run: &CalcRunId,
    ) -> Result<UpsertSummary> {
        if let Some(bad) = rows.iter().find(|r| !r.raw_value.is_finite()) {
            return Err(RondaError::InvalidData(format!(
                "non-finite raw value for security {} on {}",
                bad.security_id, bad.trade_date
            )));
        }

        let updated_at = Utc::now().to_rfc3339();
        let mut summary = UpsertSummary::default();
        let mut conn = self.db.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RondaError::storage)?;
        {
            let mut exists = tx
                .prepare_cached(
                    "SELECT 1 FROM factor_values
                     WHERE security_id = ?1 AND trade_date = ?2 AND factor_id = ?3",
                )
                .map_err(RondaError::storage)?;
            let mut upsert = tx
                .prepare_cached(
                    "INSERT INTO factor_values
                        (security_id, trade_date, factor_id, raw_value, market_zscore,
                         market_rank_pct, sector_zscore, sector_rank_pct, calc_run_id, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                     ON CONFLICT(security_id, trade_date, factor_id) DO UPDATE SET
                        raw_value = excluded.raw_value,
                        market_zscore = excluded.market_zscore,
                        market_rank_pct = excluded.market_rank_pct,
                        sector_zscore = excluded.sector_zscore,
                        sector_rank_pct = excluded.sector_rank_pct,
                        calc_run_id = excluded.calc_run_id,
                        updated_at = excluded.updated_at",
                )
                .map_err(RondaError::storage)?;

            for (batch, chunk) in rows.chunks(self.db.batch_size()).enumerate() {
                for row in chunk {
                    let date = format_date(row.trade_date);
                    let existed = exists
                        .exists(params![row.security_id, date, factor_id])
                        .map_err(RondaError::storage)?;
                    upsert
                        .execute(params![
                            row.security_id,
                            date,
                            factor_id,
                            row.raw_value,
                            row.market_zscore,
                            row.market_rank_pct,
                            row.sector_zscore,
                            row.sector_rank_pct,
                            run.as_str(),
                            updated_at,
                        ])
                        .map_err(RondaError::storage)?;
                    if existed {
                        summary.updated += 1;
                    } else {
                        summary.inserted += 1;
                    }
                }
                debug!(factor_id, batch, rows = chunk.len(), "wrote batch");
            }
        }
        tx.commit().map_err(RondaError::storage)?;

        info!(
            factor_id,
            run = %run,
            inserted = summary.inserted,
            updated = summary.updated,
            "upserted factor values"
        );
        Ok(summary)
    }

    fn definition(&self, name: &str) -> Result<Option<RegisteredFactor>> {
        let conn = self.db.connection()?;
        conn.query_row(
            &format!("SELECT {DEFINITION_COLUMNS} FROM factor_definitions WHERE name = ?1"),
            params![name],
            registered_from_row,
        )
        .optional()
        .map_err(RondaError::storage)
    }

    fn list_definitions(&self, active_only: bool) -> Result<Vec<RegisteredFactor>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {DEFINITION_COLUMNS} FROM factor_definitions
                 WHERE (?1 = 0 OR is_active = 1)
                 ORDER BY category, name"
            ))
            .map_err(RondaError::storage)?;

        let rows = stmt
            .query_map(params![active_only], registered_from_row)
            .map_err(RondaError::storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(RondaError::storage)
    }

    fn load_values(&self, factor_id: FactorId, range: &DateRange) -> Result<Vec<FactorValue>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT security_id, trade_date, factor_id, raw_value, market_zscore,
                        market_rank_pct, sector_zscore, sector_rank_pct, calc_run_id, updated_at
                 FROM factor_values
                 WHERE factor_id = ?1
                   AND (?2 IS NULL OR trade_date >= ?2)
                   AND (?3 IS NULL OR trade_date <= ?3)
                 ORDER BY trade_date, security_id",
            )
            .map_err(RondaError::storage)?;

        let rows = stmt
            .query_map(
                params![
                    factor_id,
                    range.start.map(format_date),
                    range.end.map(format_date)
                ],
                |row| {
                    Ok(FactorValue {
                        security_id: row.get(0)?,
                        trade_date: read_date(row, 1)?,
                        factor_id: row.get(2)?,
                        raw_value: row.get(3)?,
                        market_zscore: row.get(4)?,
                        market_rank_pct: row.get(5)?,
                        sector_zscore: row.get(6)?,
                        sector_rank_pct: row.get(7)?,
                        calc_run_id: run_id_from(row, 8)?,
                        updated_at: timestamp_from(row, 9)?,
                    })
                },
            )
            .map_err(RondaError::storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(RondaError::storage)
    }
}

fn conversion_error(idx: usize, err: RondaError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn registered_from_row(row: &Row<'_>) -> rusqlite::Result<RegisteredFactor> {
    let category: String = row.get(2)?;
    let category: FactorCategory = category.parse().map_err(|e| conversion_error(2, e))?;
    let params_json: String = row.get(3)?;
    let parameters = serde_json::from_str(&params_json)
        .map_err(|e| conversion_error(3, RondaError::Serialization(e)))?;
    let tags: String = row.get(9)?;

    Ok(RegisteredFactor {
        factor_id: row.get(0)?,
        definition: FactorDefinition {
            name: row.get(1)?,
            category,
            parameters,
            description: row.get(4)?,
            version: row.get(5)?,
            formula: row.get(6)?,
            source: row.get(7)?,
            is_active: row.get(8)?,
            tags: tags
                .split(',')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        },
    })
}

fn run_id_from(row: &Row<'_>, idx: usize) -> rusqlite::Result<CalcRunId> {
    let text: String = row.get(idx)?;
    CalcRunId::new(text).map_err(|e| conversion_error(idx, e))
}

fn timestamp_from(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
