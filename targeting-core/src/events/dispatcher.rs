//! Synchronous event dispatch with zero overhead when empty.

use std::sync::Arc;

use super::handler::TargetingEventHandler;
use super::types::*;

/// Synchronous dispatcher over a list of handlers.
///
/// A panicking handler is isolated: it never prevents subsequent handlers
/// from receiving the event, and never tears down the evaluation worker.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn TargetingEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn TargetingEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn emit<F: Fn(&dyn TargetingEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!("event handler panicked; continuing");
            }
        }
    }

    pub fn emit_evaluation_started(&self, event: &EvaluationStartedEvent) {
        self.emit(|h| h.on_evaluation_started(event));
    }

    pub fn emit_evaluation_completed(&self, event: &EvaluationCompletedEvent) {
        self.emit(|h| h.on_evaluation_completed(event));
    }

    pub fn emit_evaluation_failed(&self, event: &EvaluationFailedEvent) {
        self.emit(|h| h.on_evaluation_failed(event));
    }

    pub fn emit_evaluation_cancelled(&self, event: &EvaluationCancelledEvent) {
        self.emit(|h| h.on_evaluation_cancelled(event));
    }

    pub fn emit_population_frozen(&self, event: &PopulationFrozenEvent) {
        self.emit(|h| h.on_population_frozen(event));
    }
}
