//! Targeting criteria engine: rule compiler, reference evaluator,
//! population materializer, and the asynchronous evaluation scheduler.

pub mod compiler;
pub mod evaluator;
pub mod materializer;
pub mod pipeline;
pub mod scheduler;

pub use compiler::compile;
pub use evaluator::{InMemoryPopulation, ReferenceEvaluator};
pub use materializer::{materialize, materialize_matches};
pub use pipeline::build_population;
pub use scheduler::{EvaluationHandle, EvaluationJob, EvaluationScheduler};
