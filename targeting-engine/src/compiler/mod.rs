//! Rule compiler: validates a raw rule tree against the field registry
//! and lowers it into the compiled AST.
//!
//! Validation is batch-mode: every error in the tree is collected and
//! returned together so a rule-building UI can highlight all offending
//! filters in one round trip.

mod filter;

use targeting_core::ast::{CompiledCriteria, CompiledRule, InclusionList, MemberBlock};
use targeting_core::config::{CompilePolicy, EmptyBlockPolicy};
use targeting_core::criteria::{RawBlock, RawCriteria, RawFilter};
use targeting_core::errors::{FilterLocation, ValidationError};
use targeting_core::fields::{FieldRegistry, FieldScope};

use self::filter::compile_filter;

/// Compile a raw rule tree into evaluable criteria.
///
/// Returns the full batch of validation errors on failure; the compiler
/// never stops at the first problem.
pub fn compile(
    raw: &RawCriteria,
    registry: &FieldRegistry,
    policy: CompilePolicy,
) -> Result<CompiledCriteria, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut rules = Vec::with_capacity(raw.rules.len());

    for (rule_index, raw_rule) in raw.rules.iter().enumerate() {
        if raw_rule.is_empty() {
            errors.push(ValidationError::EmptyRule { rule_index });
            continue;
        }

        let household_filters = compile_filters(
            &raw_rule.household_filters,
            FilterLocation::rule(rule_index),
            FieldScope::Household,
            registry,
            &mut errors,
        );

        // Individual blocks first, collector blocks after, sharing one
        // block index space so error locations match submission order.
        let mut member_blocks = Vec::new();
        let mut block_index = 0usize;
        for block in &raw_rule.individual_blocks {
            if let Some(compiled) = compile_block(
                block, rule_index, block_index, false, policy, registry, &mut errors,
            ) {
                member_blocks.push(compiled);
            }
            block_index += 1;
        }
        for block in &raw_rule.collector_blocks {
            if let Some(compiled) = compile_block(
                block, rule_index, block_index, true, policy, registry, &mut errors,
            ) {
                member_blocks.push(compiled);
            }
            block_index += 1;
        }

        let inclusion = if raw_rule.household_ids.is_empty() && raw_rule.individual_ids.is_empty()
        {
            None
        } else {
            Some(InclusionList {
                household_ids: raw_rule.household_ids.clone(),
                individual_ids: raw_rule.individual_ids.clone(),
            })
        };

        rules.push(CompiledRule {
            index: rule_index,
            inclusion,
            household_filters,
            member_blocks,
        });
    }

    if !errors.is_empty() {
        tracing::debug!(error_count = errors.len(), "rule tree failed validation");
        return Err(errors);
    }

    tracing::debug!(rule_count = rules.len(), "compiled targeting criteria");
    Ok(CompiledCriteria {
        rules,
        inclusion_policy: policy.inclusion,
    })
}

fn compile_filters(
    raw_filters: &[RawFilter],
    location: FilterLocation,
    scope: FieldScope,
    registry: &FieldRegistry,
    errors: &mut Vec<ValidationError>,
) -> Vec<targeting_core::ast::CompiledFilter> {
    let mut compiled = Vec::with_capacity(raw_filters.len());
    for raw in raw_filters {
        match compile_filter(raw, location, scope, registry) {
            Ok(f) => compiled.push(f),
            Err(mut filter_errors) => errors.append(&mut filter_errors),
        }
    }
    compiled
}

fn compile_block(
    block: &RawBlock,
    rule_index: usize,
    block_index: usize,
    collectors_only: bool,
    policy: CompilePolicy,
    registry: &FieldRegistry,
    errors: &mut Vec<ValidationError>,
) -> Option<MemberBlock> {
    let location = FilterLocation::block(rule_index, block_index);

    if block.filters.is_empty() {
        match policy.empty_block {
            EmptyBlockPolicy::Reject => {
                errors.push(ValidationError::EmptyBlock { location });
                return None;
            }
            EmptyBlockPolicy::AnyMemberExists => {
                return Some(MemberBlock {
                    candidates: targeting_core::ast::CandidateSet {
                        collectors_only,
                        head_only: block.target_only_head_of_household,
                    },
                    filters: Vec::new(),
                });
            }
        }
    }

    let filters = compile_filters(
        &block.filters,
        location,
        FieldScope::Individual,
        registry,
        errors,
    );

    Some(MemberBlock {
        candidates: targeting_core::ast::CandidateSet {
            collectors_only,
            head_only: block.target_only_head_of_household,
        },
        filters,
    })
}
