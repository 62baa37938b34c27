//! Event payload types.

/// Payload for `on_evaluation_started`.
#[derive(Debug, Clone)]
pub struct EvaluationStartedEvent {
    pub population_id: String,
    pub rule_count: usize,
}

/// Payload for `on_evaluation_completed`.
#[derive(Debug, Clone)]
pub struct EvaluationCompletedEvent {
    pub population_id: String,
    pub household_count: u64,
    pub duration_ms: u64,
}

/// Payload for `on_evaluation_failed`. Emitted per attempt; `will_retry`
/// distinguishes retries from terminal failures.
#[derive(Debug, Clone)]
pub struct EvaluationFailedEvent {
    pub population_id: String,
    pub message: String,
    pub attempt: u32,
    pub will_retry: bool,
}

/// Payload for `on_evaluation_cancelled`.
#[derive(Debug, Clone)]
pub struct EvaluationCancelledEvent {
    pub population_id: String,
}

/// Payload for `on_population_frozen`.
#[derive(Debug, Clone)]
pub struct PopulationFrozenEvent {
    pub population_id: String,
    pub household_count: u64,
    pub individual_count: u64,
}
