//! Target population rows and frozen snapshot reads.

use rusqlite::{params, Connection, OptionalExtension};
use targeting_core::errors::StorageError;
use targeting_core::model::FrozenPopulation;

fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

/// Create a target population in the editable (`open`) state, optionally
/// recording the submitted rule tree for audit.
pub fn create_population(
    conn: &Connection,
    population_id: &str,
    criteria_json: Option<&str>,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO target_populations (id, status, criteria_json) VALUES (?1, 'open', ?2)",
        params![population_id, criteria_json],
    )
    .map_err(sqlite_err)?;
    Ok(())
}

/// The population's status, or NotFound.
pub fn population_status(conn: &Connection, population_id: &str) -> Result<String, StorageError> {
    conn.query_row(
        "SELECT status FROM target_populations WHERE id = ?1",
        params![population_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(sqlite_err)?
    .ok_or_else(|| StorageError::NotFound {
        what: "target population",
        id: population_id.to_string(),
    })
}

/// Load a frozen snapshot: household ids ascending plus the stored
/// counts. Ordering is part of the contract — repeated reads of the same
/// snapshot paginate identically.
pub fn load_frozen(
    conn: &Connection,
    population_id: &str,
) -> Result<FrozenPopulation, StorageError> {
    let (frozen_at, status): (Option<i64>, String) = conn
        .query_row(
            "SELECT frozen_at, status FROM target_populations WHERE id = ?1",
            params![population_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(sqlite_err)?
        .ok_or_else(|| StorageError::NotFound {
            what: "target population",
            id: population_id.to_string(),
        })?;

    if status != "frozen" {
        return Err(StorageError::NotFound {
            what: "frozen snapshot",
            id: population_id.to_string(),
        });
    }

    let (household_count, individual_count): (i64, i64) = conn
        .query_row(
            "SELECT household_count, individual_count FROM frozen_counts WHERE population_id = ?1",
            params![population_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(sqlite_err)?;

    let mut stmt = conn
        .prepare_cached(
            "SELECT household_id FROM frozen_households
             WHERE population_id = ?1 ORDER BY household_id ASC",
        )
        .map_err(sqlite_err)?;
    let households = stmt
        .query_map(params![population_id], |row| row.get::<_, String>(0))
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;

    let frozen_at = frozen_at.unwrap_or(0);
    let frozen_at = chrono::DateTime::from_timestamp(frozen_at, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default();

    Ok(FrozenPopulation {
        population_id: population_id.to_string(),
        households,
        household_count: household_count as u64,
        individual_count: individual_count as u64,
        frozen_at,
    })
}

/// One page of a frozen snapshot via keyset pagination — no OFFSET, so
/// page retrieval cost is constant regardless of position.
pub fn frozen_page(
    conn: &Connection,
    population_id: &str,
    after: Option<&str>,
    limit: usize,
) -> Result<Vec<String>, StorageError> {
    let sql = if after.is_some() {
        "SELECT household_id FROM frozen_households
         WHERE population_id = ?1 AND household_id > ?2
         ORDER BY household_id ASC LIMIT ?3"
    } else {
        "SELECT household_id FROM frozen_households
         WHERE population_id = ?1
         ORDER BY household_id ASC LIMIT ?2"
    };
    let mut stmt = conn.prepare_cached(sql).map_err(sqlite_err)?;
    let rows = if let Some(cursor) = after {
        stmt.query_map(params![population_id, cursor, limit as i64], |row| {
            row.get::<_, String>(0)
        })
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
    } else {
        stmt.query_map(params![population_id, limit as i64], |row| {
            row.get::<_, String>(0)
        })
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
    };
    rows.map_err(sqlite_err)
}
