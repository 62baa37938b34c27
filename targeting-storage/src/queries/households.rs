//! Household and individual writes plus member counting.

use rusqlite::{params, Connection};
use targeting_core::errors::StorageError;
use targeting_core::model::{AttributeValue, Household, Individual};

/// Chunk size for `IN (...)` queries, safely below SQLite's bind limit.
const IN_CHUNK: usize = 500;

fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

fn attributes_json(attributes: &impl serde::Serialize) -> Result<String, StorageError> {
    serde_json::to_string(attributes).map_err(|e| StorageError::SqliteError {
        message: format!("failed to encode attributes: {e}"),
    })
}

/// Insert a household with all its members and periodic values.
pub fn insert_household(conn: &Connection, household: &Household) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO households (id, size, residence_status, address, registration_date, attributes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            household.id,
            household.size,
            household.residence_status,
            household.address,
            household.registration_date.format("%Y-%m-%d").to_string(),
            attributes_json(&household.attributes)?,
        ],
    )
    .map_err(sqlite_err)?;

    for member in &household.members {
        insert_individual(conn, &household.id, member)?;
    }
    Ok(())
}

fn insert_individual(
    conn: &Connection,
    household_id: &str,
    individual: &Individual,
) -> Result<(), StorageError> {
    let observed = serde_json::to_string(&individual.observed_disabilities).map_err(|e| {
        StorageError::SqliteError {
            message: format!("failed to encode observed disabilities: {e}"),
        }
    })?;

    conn.execute(
        "INSERT INTO individuals (id, household_id, is_head, sex, marital_status, birth_date,
                                  disability, observed_disabilities, collector_role, attributes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            individual.id,
            household_id,
            individual.is_head as i32,
            individual.sex,
            individual.marital_status,
            individual.birth_date.format("%Y-%m-%d").to_string(),
            individual.disability,
            observed,
            individual.collector_role.as_str(),
            attributes_json(&individual.attributes)?,
        ],
    )
    .map_err(sqlite_err)?;

    for ((field, round), pv) in &individual.periodic {
        let value = pv.value.as_ref().map(attribute_to_sql);
        conn.execute(
            "INSERT INTO periodic_values (individual_id, field, round, value, collected_on)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                individual.id,
                field,
                round,
                value,
                pv.collected_on.map(|d| d.format("%Y-%m-%d").to_string()),
            ],
        )
        .map_err(sqlite_err)?;
    }
    Ok(())
}

/// Encode an attribute value into the `ANY`-typed periodic value column
/// so SQL comparisons use the right affinity.
fn attribute_to_sql(value: &AttributeValue) -> rusqlite::types::Value {
    match value {
        AttributeValue::Bool(b) => rusqlite::types::Value::Integer(*b as i64),
        AttributeValue::Number(n) => rusqlite::types::Value::Real(*n),
        AttributeValue::Date(d) => {
            rusqlite::types::Value::Text(d.format("%Y-%m-%d").to_string())
        }
        AttributeValue::Text(s) => rusqlite::types::Value::Text(s.clone()),
        AttributeValue::List(items) => rusqlite::types::Value::Text(
            serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string()),
        ),
    }
}

/// Total member count across the given households.
pub fn individual_count(conn: &Connection, household_ids: &[String]) -> Result<u64, StorageError> {
    let mut total = 0u64;
    for chunk in household_ids.chunks(IN_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql =
            format!("SELECT COUNT(*) FROM individuals WHERE household_id IN ({placeholders})");
        let count: i64 = conn
            .query_row(&sql, rusqlite::params_from_iter(chunk.iter()), |row| {
                row.get(0)
            })
            .map_err(sqlite_err)?;
        total += count as u64;
    }
    Ok(total)
}

/// Total number of households in the store.
pub fn household_count(conn: &Connection) -> Result<u64, StorageError> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM households", [], |row| row.get(0))
        .map_err(sqlite_err)?;
    Ok(count as u64)
}
