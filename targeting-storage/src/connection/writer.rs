//! Write transactions for the freeze transition and population loads.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use targeting_core::errors::StorageError;

/// Run `f` inside a BEGIN IMMEDIATE transaction, committing on success
/// and rolling back on error. IMMEDIATE takes the write lock up front,
/// so racing freeze attempts serialize here instead of failing with
/// SQLITE_BUSY halfway through their statements.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, StorageError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(|e| {
        StorageError::SqliteError {
            message: format!("failed to begin immediate transaction: {e}"),
        }
    })?;

    let result = f(&tx)?;

    tx.commit().map_err(|e| StorageError::SqliteError {
        message: format!("failed to commit: {e}"),
    })?;

    Ok(result)
}
