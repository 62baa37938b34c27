//! The freeze transition: open -> frozen, exactly once.
//!
//! The whole transition runs inside one BEGIN IMMEDIATE transaction. The
//! synchronization point is a compare-and-set on the population's status
//! column: exactly one caller observes `open` and writes the snapshot,
//! every other concurrent caller loses the CAS and reads the winner's
//! snapshot back instead. Losing is not an error.

use rusqlite::params;
use targeting_core::errors::StorageError;
use targeting_core::model::{FrozenPopulation, MaterializedPopulation};

use crate::connection::writer::with_immediate_transaction;
use crate::connection::PopulationDb;
use crate::queries::populations;

/// Freeze a target population with the given materialized membership.
///
/// Idempotent under concurrency: whichever caller wins the status CAS
/// persists its snapshot; all callers get the winning snapshot back. A
/// population that does not exist is an error.
pub fn freeze(
    db: &PopulationDb,
    population_id: &str,
    population: &MaterializedPopulation,
) -> Result<FrozenPopulation, StorageError> {
    db.with_writer(|conn| {
        with_immediate_transaction(conn, |tx| {
            let changed = tx
                .execute(
                    "UPDATE target_populations
                     SET status = 'frozen', frozen_at = unixepoch()
                     WHERE id = ?1 AND status = 'open'",
                    params![population_id],
                )
                .map_err(|e| StorageError::SqliteError {
                    message: e.to_string(),
                })?;

            if changed == 0 {
                // Lost the CAS, or the population never existed. Status
                // read distinguishes the two.
                let status = populations::population_status(tx, population_id)?;
                if status == "frozen" {
                    tracing::debug!(population_id, "freeze already applied, returning snapshot");
                    return populations::load_frozen(tx, population_id);
                }
                tracing::warn!(population_id, status, "freeze refused");
                return Err(StorageError::FreezeConflict {
                    population_id: population_id.to_string(),
                });
            }

            let mut insert = tx
                .prepare_cached(
                    "INSERT INTO frozen_households (population_id, household_id)
                     VALUES (?1, ?2)",
                )
                .map_err(|e| StorageError::SqliteError {
                    message: e.to_string(),
                })?;
            for household_id in &population.households {
                insert
                    .execute(params![population_id, household_id])
                    .map_err(|e| StorageError::SqliteError {
                        message: e.to_string(),
                    })?;
            }
            drop(insert);

            tx.execute(
                "INSERT INTO frozen_counts (population_id, household_count, individual_count)
                 VALUES (?1, ?2, ?3)",
                params![
                    population_id,
                    population.household_count as i64,
                    population.individual_count as i64,
                ],
            )
            .map_err(|e| StorageError::SqliteError {
                message: e.to_string(),
            })?;

            tracing::info!(
                population_id,
                households = population.household_count,
                individuals = population.individual_count,
                "population frozen"
            );

            populations::load_frozen(tx, population_id)
        })
    })
}
