//! In-memory population snapshot.

use rustc_hash::FxHashMap;

use targeting_core::errors::EvaluationError;
use targeting_core::model::Household;
use targeting_core::traits::PopulationAccess;

/// The full candidate population held in memory, indexed by household id.
/// Backs the reference evaluator and small-dataset flows.
pub struct InMemoryPopulation {
    households: Vec<Household>,
    by_household_id: FxHashMap<String, usize>,
}

impl InMemoryPopulation {
    pub fn new(mut households: Vec<Household>) -> Self {
        // Sort once so evaluation order (and thus cursors) is stable.
        households.sort_by(|a, b| a.id.cmp(&b.id));

        let mut by_household_id = FxHashMap::default();
        for (idx, hh) in households.iter().enumerate() {
            by_household_id.insert(hh.id.clone(), idx);
        }

        Self {
            households,
            by_household_id,
        }
    }

    /// Households in ascending id order.
    pub fn households(&self) -> &[Household] {
        &self.households
    }

    pub fn household(&self, id: &str) -> Option<&Household> {
        self.by_household_id.get(id).map(|&i| &self.households[i])
    }

    pub fn len(&self) -> usize {
        self.households.len()
    }

    pub fn is_empty(&self) -> bool {
        self.households.is_empty()
    }
}

impl PopulationAccess for InMemoryPopulation {
    fn individual_count(&self, household_ids: &[String]) -> Result<u64, EvaluationError> {
        let mut count = 0u64;
        for id in household_ids {
            if let Some(hh) = self.household(id) {
                count += hh.members.len() as u64;
            }
        }
        Ok(count)
    }
}
