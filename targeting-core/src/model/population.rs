//! Materialized and frozen target-population artifacts.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The concrete outcome of evaluating targeting criteria: an ordered,
/// de-duplicated set of household references plus counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedPopulation {
    /// Household ids, ascending, unique.
    pub households: Vec<String>,
    pub household_count: u64,
    /// Total members across the included households.
    pub individual_count: u64,
}

impl MaterializedPopulation {
    pub fn is_empty(&self) -> bool {
        self.households.is_empty()
    }
}

/// An immutable snapshot of a target population after the freeze
/// transition. Decoupled from the rule tree that produced it: later edits
/// to the tree have no effect on this set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenPopulation {
    pub population_id: String,
    pub households: Vec<String>,
    pub household_count: u64,
    pub individual_count: u64,
    pub frozen_at: NaiveDateTime,
}
