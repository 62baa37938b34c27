//! Population materializer: evaluator output → the concrete artifact.

use targeting_core::errors::EvaluationError;
use targeting_core::model::MaterializedPopulation;
use targeting_core::traits::{PopulationAccess, PopulationResult};

/// Drain an evaluation result into an ordered, de-duplicated household
/// set with counts. The individual count comes from the store so it
/// reflects full household membership, not just witnesses.
pub fn materialize(
    result: PopulationResult,
    store: &dyn PopulationAccess,
    batch_size: usize,
) -> Result<MaterializedPopulation, EvaluationError> {
    let matches = result.collect_all(batch_size)?;
    materialize_matches(matches, store)
}

/// Same, over matches already drained by the caller (the scheduler drains
/// cooperatively to honor cancellation and timeout between batches).
pub fn materialize_matches(
    matches: Vec<targeting_core::traits::HouseholdMatch>,
    store: &dyn PopulationAccess,
) -> Result<MaterializedPopulation, EvaluationError> {
    let mut households: Vec<String> = matches.into_iter().map(|m| m.household_id).collect();
    households.sort_unstable();
    households.dedup();

    let individual_count = store.individual_count(&households)?;
    let household_count = households.len() as u64;

    tracing::debug!(household_count, individual_count, "materialized population");

    Ok(MaterializedPopulation {
        households,
        household_count,
        individual_count,
    })
}
