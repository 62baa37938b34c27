//! Compile-time policy knobs for behavior the product left ambiguous.

use serde::{Deserialize, Serialize};

/// How an explicit household/individual inclusion list combines with the
/// same rule's filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InclusionPolicy {
    /// Listed records are in regardless of the filters (OR).
    #[default]
    BypassFilters,
    /// Listed records must also satisfy the filters (AND).
    RequireFilters,
}

/// What to do with an individual/collector block that has zero filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyBlockPolicy {
    /// Reject at compile time. The default until the existential reading
    /// is confirmed by product requirements.
    #[default]
    Reject,
    /// Compile to a bare "at least one candidate member exists" check.
    AnyMemberExists,
}

/// Policies passed to `compile` alongside the raw tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilePolicy {
    pub inclusion: InclusionPolicy,
    pub empty_block: EmptyBlockPolicy,
}
