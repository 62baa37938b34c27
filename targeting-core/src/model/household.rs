//! Household and individual records as loaded from the population store.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::value::AttributeValue;

/// Payment-collector role an individual holds on a household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectorRole {
    None,
    Primary,
    Alternate,
}

impl CollectorRole {
    pub fn is_collector(self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Primary => "PRIMARY",
            Self::Alternate => "ALTERNATE",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "PRIMARY" => Self::Primary,
            "ALTERNATE" => Self::Alternate,
            _ => Self::None,
        }
    }
}

/// A per-round value of a periodic field. A round may exist with no
/// recorded value yet; such rounds never match any filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicValue {
    pub value: Option<AttributeValue>,
    pub collected_on: Option<NaiveDate>,
}

/// A member of a household.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    pub id: String,
    pub is_head: bool,
    pub sex: String,
    pub marital_status: String,
    pub birth_date: NaiveDate,
    pub disability: String,
    pub observed_disabilities: Vec<String>,
    pub collector_role: CollectorRole,
    /// Custom (flex) attributes keyed by field name.
    #[serde(default)]
    pub attributes: FxHashMap<String, AttributeValue>,
    /// Periodic field values keyed by (field name, round).
    #[serde(default, skip)]
    pub periodic: FxHashMap<(String, u32), PeriodicValue>,
}

impl Individual {
    /// Resolve a built-in (core) individual field by name.
    pub fn core_value(&self, field: &str) -> Option<AttributeValue> {
        match field {
            "sex" => Some(AttributeValue::Text(self.sex.clone())),
            "marital_status" => Some(AttributeValue::Text(self.marital_status.clone())),
            "birth_date" => Some(AttributeValue::Date(self.birth_date)),
            "disability" => Some(AttributeValue::Text(self.disability.clone())),
            "observed_disabilities" => {
                Some(AttributeValue::List(self.observed_disabilities.clone()))
            }
            _ => None,
        }
    }

    /// Look up a periodic value for a given field and round.
    pub fn periodic_value(&self, field: &str, round: u32) -> Option<&PeriodicValue> {
        self.periodic.get(&(field.to_string(), round))
    }
}

/// A household record with its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: String,
    pub size: i64,
    pub residence_status: String,
    pub address: String,
    pub registration_date: NaiveDate,
    /// Custom (flex) attributes keyed by field name.
    #[serde(default)]
    pub attributes: FxHashMap<String, AttributeValue>,
    pub members: Vec<Individual>,
}

impl Household {
    /// Resolve a built-in (core) household field by name.
    pub fn core_value(&self, field: &str) -> Option<AttributeValue> {
        match field {
            "size" => Some(AttributeValue::Number(self.size as f64)),
            "residence_status" => Some(AttributeValue::Text(self.residence_status.clone())),
            "address" => Some(AttributeValue::Text(self.address.clone())),
            "registration_date" => Some(AttributeValue::Date(self.registration_date)),
            _ => None,
        }
    }

    /// The head of household, if one is flagged.
    pub fn head(&self) -> Option<&Individual> {
        self.members.iter().find(|m| m.is_head)
    }

    /// Members holding a primary or alternate collector role.
    pub fn collectors(&self) -> impl Iterator<Item = &Individual> {
        self.members
            .iter()
            .filter(|m| m.collector_role.is_collector())
    }
}
