//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use targeting_core::criteria::{
    ComparisonMethod, FlexFieldClassification, RawBlock, RawCriteria, RawFilter, RawRule,
};
use targeting_core::fields::{FieldRegistry, StaticFieldSource};
use targeting_core::model::{CollectorRole, Household, Individual, PeriodicValue};

pub fn registry() -> FieldRegistry {
    FieldRegistry::new(Arc::new(StaticFieldSource::with_core_schema()))
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

pub fn filter(
    field: &str,
    method: ComparisonMethod,
    arguments: Vec<serde_json::Value>,
    classification: FlexFieldClassification,
) -> RawFilter {
    RawFilter {
        field_name: field.to_string(),
        comparison_method: method,
        arguments,
        flex_field_classification: classification,
        round_number: None,
    }
}

pub fn core_filter(
    field: &str,
    method: ComparisonMethod,
    arguments: Vec<serde_json::Value>,
) -> RawFilter {
    filter(field, method, arguments, FlexFieldClassification::Core)
}

pub fn household_rule(filters: Vec<RawFilter>) -> RawRule {
    RawRule {
        household_filters: filters,
        ..Default::default()
    }
}

pub fn block_rule(blocks: Vec<RawBlock>) -> RawRule {
    RawRule {
        individual_blocks: blocks,
        ..Default::default()
    }
}

pub fn criteria(rules: Vec<RawRule>) -> RawCriteria {
    RawCriteria { rules }
}

pub struct IndividualSpec {
    pub id: &'static str,
    pub is_head: bool,
    pub sex: &'static str,
    pub marital_status: &'static str,
    pub birth_date: &'static str,
    pub collector_role: CollectorRole,
}

impl Default for IndividualSpec {
    fn default() -> Self {
        Self {
            id: "IND-0",
            is_head: false,
            sex: "FEMALE",
            marital_status: "SINGLE",
            birth_date: "1990-01-01",
            collector_role: CollectorRole::None,
        }
    }
}

pub fn individual(spec: IndividualSpec) -> Individual {
    Individual {
        id: spec.id.to_string(),
        is_head: spec.is_head,
        sex: spec.sex.to_string(),
        marital_status: spec.marital_status.to_string(),
        birth_date: date(spec.birth_date),
        disability: "NOT_DISABLED".to_string(),
        observed_disabilities: Vec::new(),
        collector_role: spec.collector_role,
        attributes: Default::default(),
        periodic: Default::default(),
    }
}

pub fn household(id: &str, members: Vec<Individual>) -> Household {
    Household {
        id: id.to_string(),
        size: members.len() as i64,
        residence_status: "HOST".to_string(),
        address: String::new(),
        registration_date: date("2023-06-01"),
        attributes: Default::default(),
        members,
    }
}

pub fn with_periodic(
    mut individual: Individual,
    field: &str,
    round: u32,
    value: Option<targeting_core::model::AttributeValue>,
    collected_on: Option<&str>,
) -> Individual {
    individual.periodic.insert(
        (field.to_string(), round),
        PeriodicValue {
            value,
            collected_on: collected_on.map(date),
        },
    );
    individual
}
