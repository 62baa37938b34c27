//! Storage-layer errors.

use super::error_code::{self, TargetingErrorCode};

/// Errors from the SQLite persistence layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("{what} `{id}` not found")]
    NotFound { what: &'static str, id: String },

    /// Another caller already froze this population. Benign: callers
    /// resolve to the existing snapshot instead of failing.
    #[error("population `{population_id}` is already frozen")]
    FreezeConflict { population_id: String },
}

impl TargetingErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::NotFound { .. } => error_code::NOT_FOUND,
            Self::FreezeConflict { .. } => error_code::FREEZE_CONFLICT,
        }
    }
}
