//! Versioned schema migrations tracked via `PRAGMA user_version`.

pub mod v001_population;
pub mod v002_target_populations;

use rusqlite::Connection;
use targeting_core::errors::StorageError;

const MIGRATIONS: &[(u32, &str)] = &[
    (1, v001_population::MIGRATION_SQL),
    (2, v002_target_populations::MIGRATION_SQL),
];

/// Apply all pending migrations, in order, each in its own transaction.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;

    for &(version, sql) in MIGRATIONS {
        if version <= current {
            continue;
        }
        tracing::info!(version, "applying migration");
        conn.execute_batch(&format!(
            "BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;"
        ))
        .map_err(|e| StorageError::MigrationFailed {
            version,
            message: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_cleanly_and_idempotently() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: u32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.last().unwrap().0);

        // Spot-check the schema.
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('households', 'individuals', 'periodic_values',
                              'target_populations', 'frozen_households')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 5);
    }
}
