//! Synchronous compile-evaluate-materialize pipeline.

use chrono::NaiveDate;

use targeting_core::config::CompilePolicy;
use targeting_core::criteria::RawCriteria;
use targeting_core::errors::EngineError;
use targeting_core::fields::FieldRegistry;
use targeting_core::model::MaterializedPopulation;
use targeting_core::traits::{Evaluator, PopulationAccess};

use crate::compiler::compile;
use crate::materializer::materialize;

/// Run a raw rule tree against a backend in one call, folding every
/// subsystem error into [`EngineError`].
///
/// This is the blocking path for tooling and small populations. Callers
/// needing cancellation, timeouts, or retries go through the scheduler.
pub fn build_population(
    raw: &RawCriteria,
    registry: &FieldRegistry,
    policy: CompilePolicy,
    evaluator: &dyn Evaluator,
    store: &dyn PopulationAccess,
    evaluation_date: NaiveDate,
    batch_size: usize,
) -> Result<MaterializedPopulation, EngineError> {
    let criteria = compile(raw, registry, policy)?;
    let result = evaluator.evaluate(&criteria, evaluation_date)?;
    Ok(materialize(result, store, batch_size)?)
}
