//! Reference evaluator: direct AST interpretation over the in-memory
//! population.

use std::sync::Arc;

use chrono::NaiveDate;

use targeting_core::ast::{CompiledCriteria, CompiledRule, MemberBlock};
use targeting_core::config::InclusionPolicy;
use targeting_core::errors::EvaluationError;
use targeting_core::model::{Household, Individual};
use targeting_core::traits::{Evaluator, HouseholdMatch, MatchCursor, PopulationResult};

use super::matching::{household_filter_matches, individual_filter_matches};
use super::memory::InMemoryPopulation;

/// In-memory backend. Iterates households in ascending id order, so the
/// resulting match sequence is deterministic and each household appears
/// exactly once no matter how many rules it satisfies.
pub struct ReferenceEvaluator {
    population: Arc<InMemoryPopulation>,
}

impl ReferenceEvaluator {
    pub fn new(population: Arc<InMemoryPopulation>) -> Self {
        Self { population }
    }

    fn match_household(
        &self,
        household: &Household,
        criteria: &CompiledCriteria,
        evaluation_date: NaiveDate,
    ) -> Option<HouseholdMatch> {
        for rule in &criteria.rules {
            if let Some(witness) =
                self.match_rule(household, rule, criteria.inclusion_policy, evaluation_date)
            {
                return Some(HouseholdMatch {
                    household_id: household.id.clone(),
                    witness,
                });
            }
        }
        None
    }

    /// Returns `Some(witness)` when the household satisfies the rule.
    /// The witness is the member satisfying the first member block, when
    /// the rule has one and the match came through the filters.
    fn match_rule(
        &self,
        household: &Household,
        rule: &CompiledRule,
        policy: InclusionPolicy,
        evaluation_date: NaiveDate,
    ) -> Option<Option<String>> {
        let included = rule.inclusion.as_ref().is_some_and(|list| {
            list.household_ids.iter().any(|id| *id == household.id)
                || household
                    .members
                    .iter()
                    .any(|m| list.individual_ids.iter().any(|id| *id == m.id))
        });

        let has_filters = !rule.household_filters.is_empty() || !rule.member_blocks.is_empty();
        if !has_filters {
            // EmptyRule validation guarantees an inclusion list exists.
            return included.then_some(None);
        }

        let filters_pass = rule
            .household_filters
            .iter()
            .all(|f| household_filter_matches(f, household, evaluation_date));

        let mut witness = None;
        let blocks_pass = filters_pass
            && rule.member_blocks.iter().enumerate().all(|(i, block)| {
                match block_witness(household, block, evaluation_date) {
                    Some(member_id) => {
                        if i == 0 {
                            witness = Some(member_id);
                        }
                        true
                    }
                    None => false,
                }
            });
        let satisfied = filters_pass && blocks_pass;

        match policy {
            InclusionPolicy::BypassFilters => {
                if satisfied {
                    Some(witness)
                } else if included {
                    Some(None)
                } else {
                    None
                }
            }
            InclusionPolicy::RequireFilters => {
                let inclusion_ok = rule.inclusion.is_none() || included;
                (satisfied && inclusion_ok).then_some(witness)
            }
        }
    }
}

/// Existential check: the lowest-id candidate member satisfying every
/// filter in the block, or `None` when no member does.
fn block_witness(
    household: &Household,
    block: &MemberBlock,
    evaluation_date: NaiveDate,
) -> Option<String> {
    let candidate = |m: &&Individual| {
        (!block.candidates.head_only || m.is_head)
            && (!block.candidates.collectors_only || m.collector_role.is_collector())
    };

    household
        .members
        .iter()
        .filter(candidate)
        .filter(|m| {
            block
                .filters
                .iter()
                .all(|f| individual_filter_matches(f, m, evaluation_date))
        })
        .map(|m| m.id.clone())
        .min()
}

/// Cursor over an already-computed match list.
struct VecCursor {
    matches: Vec<HouseholdMatch>,
    position: usize,
}

impl MatchCursor for VecCursor {
    fn next_batch(&mut self, max: usize) -> Result<Vec<HouseholdMatch>, EvaluationError> {
        let end = (self.position + max).min(self.matches.len());
        let page = self.matches[self.position..end].to_vec();
        self.position = end;
        Ok(page)
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.position = 0;
        Ok(())
    }
}

impl Evaluator for ReferenceEvaluator {
    fn evaluate(
        &self,
        criteria: &CompiledCriteria,
        evaluation_date: NaiveDate,
    ) -> Result<PopulationResult, EvaluationError> {
        let matches: Vec<HouseholdMatch> = self
            .population
            .households()
            .iter()
            .filter_map(|h| self.match_household(h, criteria, evaluation_date))
            .collect();

        tracing::debug!(
            total = self.population.len(),
            matched = matches.len(),
            "reference evaluation complete"
        );

        let total_count = matches.len() as u64;
        Ok(PopulationResult {
            matches: Box::new(VecCursor {
                matches,
                position: 0,
            }),
            total_count,
        })
    }

    // The in-memory backend has nowhere to push the count down to; it
    // counts while evaluating, without keeping the matches.
    fn count_only(
        &self,
        criteria: &CompiledCriteria,
        evaluation_date: NaiveDate,
    ) -> Result<u64, EvaluationError> {
        let count = self
            .population
            .households()
            .iter()
            .filter(|h| self.match_household(h, criteria, evaluation_date).is_some())
            .count();
        Ok(count as u64)
    }
}
