//! Raw rule-tree payload types.
//!
//! These mirror the persisted nested records one-to-one so a stored tree
//! reconstructs the same AST deterministically. Validation happens in the
//! compiler, not here; serde only enforces shape.

use serde::{Deserialize, Serialize};

/// How a filter compares its field value against its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonMethod {
    /// Exactly one argument, type-matched to the field.
    Equals,
    /// Exactly two arguments forming a closed interval.
    Range,
    /// One numeric or date argument; inclusive lower bound.
    GreaterThan,
    /// One numeric or date argument; inclusive upper bound.
    LessThan,
    /// One or more arguments; matches when the field's value set and the
    /// arguments intersect.
    MultiSelectMatch,
}

impl ComparisonMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::Range => "RANGE",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
            Self::MultiSelectMatch => "MULTI_SELECT_MATCH",
        }
    }
}

/// Where the compared value lives on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlexFieldClassification {
    /// A declared relational attribute of the record.
    Core,
    /// A key in the record's open-ended attribute map.
    Custom,
    /// A key in the per-round value store; `round_number` selects the round.
    Periodic,
}

impl FlexFieldClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::Custom => "CUSTOM",
            Self::Periodic => "PERIODIC",
        }
    }
}

/// A leaf filter as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFilter {
    pub field_name: String,
    pub comparison_method: ComparisonMethod,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
    pub flex_field_classification: FlexFieldClassification,
    #[serde(default)]
    pub round_number: Option<u32>,
}

/// An individual or collector filter block: filters ANDed together,
/// satisfied existentially by at least one candidate member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawBlock {
    #[serde(default)]
    pub filters: Vec<RawFilter>,
    #[serde(default)]
    pub target_only_head_of_household: bool,
}

/// One rule: the unit of AND-composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawRule {
    /// Explicit household inclusion list; combination with the filters is
    /// policy-driven.
    #[serde(default)]
    pub household_ids: Vec<String>,
    /// Explicit individual inclusion list; includes the individuals'
    /// households.
    #[serde(default)]
    pub individual_ids: Vec<String>,
    #[serde(default)]
    pub household_filters: Vec<RawFilter>,
    #[serde(default)]
    pub individual_blocks: Vec<RawBlock>,
    #[serde(default)]
    pub collector_blocks: Vec<RawBlock>,
}

impl RawRule {
    /// True when the rule carries nothing at all — a configuration error.
    pub fn is_empty(&self) -> bool {
        self.household_ids.is_empty()
            && self.individual_ids.is_empty()
            && self.household_filters.is_empty()
            && self.individual_blocks.is_empty()
            && self.collector_blocks.is_empty()
    }
}

/// The whole submitted tree: a household is targeted when it satisfies at
/// least one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawCriteria {
    pub rules: Vec<RawRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_methods_round_trip_screaming_snake_case() {
        let json = serde_json::to_string(&ComparisonMethod::MultiSelectMatch).unwrap();
        assert_eq!(json, "\"MULTI_SELECT_MATCH\"");
        let back: ComparisonMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ComparisonMethod::MultiSelectMatch);
    }

    #[test]
    fn missing_optional_payload_fields_default() {
        let json = r#"{
            "field_name": "size",
            "comparison_method": "EQUALS",
            "arguments": [3],
            "flex_field_classification": "CORE"
        }"#;
        let filter: RawFilter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.round_number, None);
        assert_eq!(filter.arguments.len(), 1);
    }

    #[test]
    fn empty_rule_detection() {
        assert!(RawRule::default().is_empty());
        let rule = RawRule {
            household_ids: vec!["HH-1".to_string()],
            ..Default::default()
        };
        assert!(!rule.is_empty());
    }
}
