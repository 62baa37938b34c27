//! Field descriptors: type, multiplicity, storage, and scope of a
//! queryable field.

use serde::{Deserialize, Serialize};

/// The declared value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Number,
    Date,
    Bool,
    Enum,
    MultiEnum,
}

/// Where a field's value is stored on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStorage {
    /// A declared relational attribute (a real column).
    Core,
    /// A key in the record's open-ended attribute map.
    Custom,
    /// A key in the per-round value store.
    Periodic,
}

impl FieldStorage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::Custom => "CUSTOM",
            Self::Periodic => "PERIODIC",
        }
    }
}

/// Which record type the field lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldScope {
    Household,
    Individual,
}

/// Virtual fields are computed at evaluation time rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualField {
    /// Age in whole years, derived from `birth_date` at the evaluation
    /// date. Results can change between evaluations of an unmodified rule.
    AgeFromBirthDate,
}

/// Everything the compiler needs to know about one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub value_type: ValueType,
    pub storage: FieldStorage,
    pub scope: FieldScope,
    pub multi_valued: bool,
    /// For periodic fields: how many rounds exist (1-based).
    pub rounds: Option<u32>,
    /// For enum / multi-enum fields: the admissible values.
    pub choices: Option<Vec<String>>,
    /// Set when the field is computed rather than stored.
    pub virtual_source: Option<VirtualField>,
}

impl FieldDescriptor {
    /// Shorthand for a stored scalar field.
    pub fn scalar(
        name: &str,
        value_type: ValueType,
        storage: FieldStorage,
        scope: FieldScope,
    ) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            storage,
            scope,
            multi_valued: false,
            rounds: None,
            choices: None,
            virtual_source: None,
        }
    }

    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = Some(choices.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    pub fn is_orderable(&self) -> bool {
        matches!(self.value_type, ValueType::Number | ValueType::Date)
    }
}
