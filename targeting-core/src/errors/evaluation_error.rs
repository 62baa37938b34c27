//! Runtime evaluation errors.

use super::error_code::{self, TargetingErrorCode};
use super::StorageError;

/// Errors raised while executing compiled criteria against a population
/// store. Store I/O failures are retryable; timeouts retry with backoff;
/// cancellation is terminal.
///
/// A compiled AST that violates its own invariants during evaluation is a
/// programming error and panics rather than surfacing here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvaluationError {
    #[error("evaluation failed: {message}")]
    Failed { message: String },

    #[error("evaluation timed out after {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },

    #[error("evaluation cancelled")]
    Cancelled,
}

impl EvaluationError {
    /// Whether the surrounding task infrastructure should retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::TimedOut { .. })
    }
}

impl From<StorageError> for EvaluationError {
    fn from(e: StorageError) -> Self {
        Self::Failed {
            message: e.to_string(),
        }
    }
}

impl TargetingErrorCode for EvaluationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Failed { .. } => error_code::EVALUATION_FAILED,
            Self::TimedOut { .. } => error_code::EVALUATION_TIMED_OUT,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}
