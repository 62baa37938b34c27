//! Event handler trait with no-op defaults.

use super::types::*;

/// Implemented by collaborators that want evaluation lifecycle
/// notifications (API layer, audit log). All methods default to no-ops so
/// handlers implement only what they care about.
pub trait TargetingEventHandler: Send + Sync {
    fn on_evaluation_started(&self, _event: &EvaluationStartedEvent) {}
    fn on_evaluation_completed(&self, _event: &EvaluationCompletedEvent) {}
    fn on_evaluation_failed(&self, _event: &EvaluationFailedEvent) {}
    fn on_evaluation_cancelled(&self, _event: &EvaluationCancelledEvent) {}
    fn on_population_frozen(&self, _event: &PopulationFrozenEvent) {}
}
