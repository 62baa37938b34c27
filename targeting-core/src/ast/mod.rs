//! The compiled criteria AST.
//!
//! An explicit tagged-union tree produced once by the compiler and then
//! interpreted by either evaluator backend. Pure data: no references back
//! to storage, serializable, cacheable.

pub mod age;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::InclusionPolicy;

/// A typed comparison argument, checked against the field's declared type
/// at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

/// Where a compiled filter reads its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldBinding {
    /// A core column on the household record.
    HouseholdCore { field: String, multi_valued: bool },
    /// A core column on the individual record.
    IndividualCore { field: String, multi_valued: bool },
    /// A key in the household's custom attribute map.
    HouseholdCustom { key: String, multi_valued: bool },
    /// A key in the individual's custom attribute map.
    IndividualCustom { key: String, multi_valued: bool },
    /// A key plus round in the individual's per-round value store. An
    /// uncollected round never matches, for any comparison method.
    Periodic {
        key: String,
        round: u32,
        multi_valued: bool,
    },
    /// Age in whole years, recomputed from `birth_date` at evaluation
    /// time. Lowered to closed birth-date bounds by both backends.
    Age,
}

/// The comparison half of a compiled filter.
///
/// `AtLeast`/`AtMost` are the lowered forms of GREATER_THAN/LESS_THAN;
/// both bounds are inclusive, matching the observed system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompiledComparison {
    Equals(TypedValue),
    /// Closed interval, inclusive on both ends.
    Range(TypedValue, TypedValue),
    AtLeast(TypedValue),
    AtMost(TypedValue),
    /// Matches when the field's value set intersects the arguments.
    MultiSelectMatch(Vec<String>),
}

/// A compiled leaf predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFilter {
    pub binding: FieldBinding,
    pub comparison: CompiledComparison,
}

/// Which members of a household are candidates for a block's existential
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    /// Restrict to members holding a primary or alternate collector role.
    pub collectors_only: bool,
    /// Restrict to the head of household.
    pub head_only: bool,
}

/// A member filter block: satisfied when at least one candidate member
/// satisfies every filter simultaneously. Different blocks on the same
/// rule may be satisfied by different members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBlock {
    pub candidates: CandidateSet,
    /// ANDed. Empty only under the `AnyMemberExists` compile policy, in
    /// which case the block is a bare existence check.
    pub filters: Vec<CompiledFilter>,
}

/// Explicit record inclusion attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionList {
    pub household_ids: Vec<String>,
    pub individual_ids: Vec<String>,
}

impl InclusionList {
    pub fn is_empty(&self) -> bool {
        self.household_ids.is_empty() && self.individual_ids.is_empty()
    }
}

/// One compiled rule. A household satisfies it when it passes every
/// household filter AND every member block (and the inclusion list,
/// combined per the criteria's policy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledRule {
    /// Index into the submitted tree, for diagnostics.
    pub index: usize,
    pub inclusion: Option<InclusionList>,
    pub household_filters: Vec<CompiledFilter>,
    pub member_blocks: Vec<MemberBlock>,
}

/// The compiled criteria: OR across rules, set semantics on the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCriteria {
    pub rules: Vec<CompiledRule>,
    /// How explicit inclusion lists combine with a rule's filters.
    pub inclusion_policy: InclusionPolicy,
}

impl CompiledCriteria {
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
