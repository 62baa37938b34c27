//! The push-down evaluator: compiled criteria executed as SQL inside
//! SQLite instead of row-by-row in process.

pub mod sql;

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;

use targeting_core::ast::CompiledCriteria;
use targeting_core::errors::{EvaluationError, StorageError};
use targeting_core::traits::{
    Evaluator, HouseholdMatch, MatchCursor, PopulationAccess, PopulationResult,
};

use crate::connection::PopulationDb;
use crate::queries::households;

use self::sql::{criteria_where, witness_case, SqlFragment};

/// SQL backend over the population store. Produces the same membership,
/// witnesses, and counts as the in-memory reference for any criteria and
/// population snapshot.
pub struct PushdownEvaluator {
    db: Arc<PopulationDb>,
}

impl PushdownEvaluator {
    pub fn new(db: Arc<PopulationDb>) -> Self {
        Self { db }
    }
}

impl Evaluator for PushdownEvaluator {
    fn evaluate(
        &self,
        criteria: &CompiledCriteria,
        evaluation_date: NaiveDate,
    ) -> Result<PopulationResult, EvaluationError> {
        let where_clause = criteria_where(criteria, evaluation_date)?;
        let witness = witness_case(criteria, evaluation_date)?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM households h WHERE {}",
            where_clause.sql
        );
        let total_count = self.db.with_reader(|conn| {
            conn.query_row(
                &count_sql,
                rusqlite::params_from_iter(where_clause.params.iter()),
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| StorageError::SqliteError {
                message: e.to_string(),
            })
        })?;

        tracing::debug!(
            rules = criteria.rule_count(),
            matched = total_count,
            "push-down evaluation complete"
        );

        Ok(PopulationResult {
            matches: Box::new(PushdownCursor {
                db: Arc::clone(&self.db),
                where_clause,
                witness,
                last_id: None,
                exhausted: false,
            }),
            total_count: total_count as u64,
        })
    }

    fn count_only(
        &self,
        criteria: &CompiledCriteria,
        evaluation_date: NaiveDate,
    ) -> Result<u64, EvaluationError> {
        let where_clause = criteria_where(criteria, evaluation_date)?;
        let sql = format!(
            "SELECT COUNT(*) FROM households h WHERE {}",
            where_clause.sql
        );
        let count = self.db.with_reader(|conn| {
            conn.query_row(
                &sql,
                rusqlite::params_from_iter(where_clause.params.iter()),
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| StorageError::SqliteError {
                message: e.to_string(),
            })
        })?;
        Ok(count as u64)
    }
}

impl PopulationAccess for PushdownEvaluator {
    fn individual_count(&self, household_ids: &[String]) -> Result<u64, EvaluationError> {
        let count = self
            .db
            .with_reader(|conn| households::individual_count(conn, household_ids))?;
        Ok(count)
    }
}

/// Keyset cursor over the matching households, ordered by id. Each batch
/// re-issues the query from the last seen id, so pages stay cheap at any
/// depth. Membership is only stable against an unchanged store.
struct PushdownCursor {
    db: Arc<PopulationDb>,
    where_clause: SqlFragment,
    witness: SqlFragment,
    last_id: Option<String>,
    exhausted: bool,
}

impl MatchCursor for PushdownCursor {
    fn next_batch(&mut self, max: usize) -> Result<Vec<HouseholdMatch>, EvaluationError> {
        if self.exhausted || max == 0 {
            return Ok(Vec::new());
        }

        let cursor_pred = if self.last_id.is_some() {
            " AND h.id > ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT h.id, {witness} FROM households h WHERE ({filter}){cursor} \
             ORDER BY h.id ASC LIMIT ?",
            witness = self.witness.sql,
            filter = self.where_clause.sql,
            cursor = cursor_pred,
        );

        // Placeholder order: witness CASE params, WHERE params, keyset
        // cursor, LIMIT.
        let mut params: Vec<SqlValue> = Vec::with_capacity(
            self.witness.params.len() + self.where_clause.params.len() + 2,
        );
        params.extend(self.witness.params.iter().cloned());
        params.extend(self.where_clause.params.iter().cloned());
        if let Some(last) = &self.last_id {
            params.push(SqlValue::Text(last.clone()));
        }
        params.push(SqlValue::Integer(max as i64));

        let page = self.db.with_reader(|conn| {
            let mut stmt = conn
                .prepare_cached(&sql)
                .map_err(|e| StorageError::SqliteError {
                    message: e.to_string(),
                })?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    Ok(HouseholdMatch {
                        household_id: row.get(0)?,
                        witness: row.get(1)?,
                    })
                })
                .map_err(|e| StorageError::SqliteError {
                    message: e.to_string(),
                })?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::SqliteError {
                    message: e.to_string(),
                })
        })?;

        match page.last() {
            Some(last) => self.last_id = Some(last.household_id.clone()),
            None => self.exhausted = true,
        }
        Ok(page)
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.last_id = None;
        self.exhausted = false;
        Ok(())
    }
}
