//! Connection pragmas.

use rusqlite::Connection;
use targeting_core::errors::StorageError;

/// Pragmas for the write connection: WAL for concurrent readers during
/// evaluation, NORMAL sync (WAL makes it durable enough), busy timeout
/// so competing freeze attempts queue instead of failing.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA cache_size = -32000;",
    )
    .map_err(|e| StorageError::SqliteError {
        message: e.to_string(),
    })
}

/// Pragmas for read-only pool connections.
pub fn apply_read_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "PRAGMA query_only = ON;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA cache_size = -32000;",
    )
    .map_err(|e| StorageError::SqliteError {
        message: e.to_string(),
    })
}
