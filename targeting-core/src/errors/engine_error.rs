//! Top-level engine error aggregating subsystem errors via `From`.

use super::error_code::TargetingErrorCode;
use super::{ConfigError, EvaluationError, StorageError, ValidationError};

/// Errors surfaced at the engine's public boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("rule tree failed validation with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<Vec<ValidationError>> for EngineError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

impl TargetingErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            // Batch reports the first error's code; the full list is
            // carried alongside for the UI.
            Self::Validation(errors) => errors
                .first()
                .map(TargetingErrorCode::error_code)
                .unwrap_or(super::error_code::EMPTY_RULE),
            Self::Evaluation(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}
