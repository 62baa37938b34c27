//! The evaluator backend seam.

use chrono::NaiveDate;

use crate::ast::CompiledCriteria;
use crate::errors::EvaluationError;

/// One matched household, with the member that satisfied the first
/// member block (when the rule had one). Both backends pick the lowest
/// individual id among satisfying candidates so results are identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseholdMatch {
    pub household_id: String,
    pub witness: Option<String>,
}

/// A restartable, lazily consumed sequence of matches.
///
/// `next_batch` pulls up to `max` further matches; an empty vec means the
/// sequence is exhausted. `reset` rewinds to the start — for the
/// push-down backend this re-issues the query, so membership is only
/// stable against an unchanged store or a frozen snapshot.
pub trait MatchCursor: Send {
    fn next_batch(&mut self, max: usize) -> Result<Vec<HouseholdMatch>, EvaluationError>;
    fn reset(&mut self) -> Result<(), EvaluationError>;
}

/// Evaluator output: the lazy match sequence plus the total count
/// (computed without materializing the full population).
pub struct PopulationResult {
    pub matches: Box<dyn MatchCursor>,
    pub total_count: u64,
}

impl PopulationResult {
    /// Drain the cursor into memory. Test/diagnostic convenience; large
    /// populations should be consumed in batches instead.
    pub fn collect_all(mut self, batch: usize) -> Result<Vec<HouseholdMatch>, EvaluationError> {
        let mut all = Vec::new();
        loop {
            let page = self.matches.next_batch(batch)?;
            if page.is_empty() {
                break;
            }
            all.extend(page);
        }
        Ok(all)
    }
}

/// A predicate evaluator backend. The reference (in-memory) and push-down
/// (SQL) implementations must produce identical membership and counts for
/// the same criteria and population snapshot.
pub trait Evaluator: Send + Sync {
    /// Evaluate compiled criteria, producing a lazy result.
    fn evaluate(
        &self,
        criteria: &CompiledCriteria,
        evaluation_date: NaiveDate,
    ) -> Result<PopulationResult, EvaluationError>;

    /// Count matches without enumerating them. Backends push this to the
    /// store where possible.
    fn count_only(
        &self,
        criteria: &CompiledCriteria,
        evaluation_date: NaiveDate,
    ) -> Result<u64, EvaluationError>;
}
