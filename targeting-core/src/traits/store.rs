//! Minimal population-store access needed outside evaluation proper.

use crate::errors::EvaluationError;

/// Read access the materializer needs beyond the evaluator itself.
pub trait PopulationAccess: Send + Sync {
    /// Total member count across the given households.
    fn individual_count(&self, household_ids: &[String]) -> Result<u64, EvaluationError>;
}
