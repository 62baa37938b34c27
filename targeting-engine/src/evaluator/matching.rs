//! Leaf filter interpretation for the reference backend.
//!
//! AST shape violations (a household filter bound to an individual field)
//! are programming errors and panic. Value-level surprises coming from
//! store data (a number where text was declared) simply fail to match.

use chrono::NaiveDate;

use targeting_core::ast::age;
use targeting_core::ast::{CompiledComparison, CompiledFilter, FieldBinding, TypedValue};
use targeting_core::model::{AttributeValue, Household, Individual};

/// Evaluate a household-level filter against a household record.
pub fn household_filter_matches(
    filter: &CompiledFilter,
    household: &Household,
    evaluation_date: NaiveDate,
) -> bool {
    let _ = evaluation_date;
    let value = match &filter.binding {
        FieldBinding::HouseholdCore { field, .. } => household.core_value(field),
        FieldBinding::HouseholdCustom { key, .. } => household.attributes.get(key).cloned(),
        other => panic!("household filter bound to member-level field: {other:?}"),
    };
    match value {
        Some(v) => value_matches(&v, &filter.comparison),
        None => false,
    }
}

/// Evaluate a member-block filter against one individual.
pub fn individual_filter_matches(
    filter: &CompiledFilter,
    individual: &Individual,
    evaluation_date: NaiveDate,
) -> bool {
    match &filter.binding {
        FieldBinding::IndividualCore { field, .. } => match individual.core_value(field) {
            Some(v) => value_matches(&v, &filter.comparison),
            None => false,
        },
        FieldBinding::IndividualCustom { key, .. } => match individual.attributes.get(key) {
            Some(v) => value_matches(v, &filter.comparison),
            None => false,
        },
        FieldBinding::Periodic { key, round, .. } => {
            // An uncollected round never matches, for any method.
            match individual.periodic_value(key, *round) {
                Some(pv) => match &pv.value {
                    Some(v) => value_matches(v, &filter.comparison),
                    None => false,
                },
                None => false,
            }
        }
        FieldBinding::Age => {
            let bounds = age::birth_date_bounds(&filter.comparison, evaluation_date)
                .expect("age filter compiled with non-numeric comparison");
            bounds.contains(individual.birth_date)
        }
        other => panic!("member filter bound to household-level field: {other:?}"),
    }
}

/// Type-aware comparison of a stored value against a compiled comparison.
fn value_matches(value: &AttributeValue, comparison: &CompiledComparison) -> bool {
    match comparison {
        CompiledComparison::Equals(arg) => equals(value, arg),
        CompiledComparison::Range(lo, hi) => {
            compare(value, lo).map_or(false, |o| o != std::cmp::Ordering::Less)
                && compare(value, hi).map_or(false, |o| o != std::cmp::Ordering::Greater)
        }
        CompiledComparison::AtLeast(arg) => {
            compare(value, arg).map_or(false, |o| o != std::cmp::Ordering::Less)
        }
        CompiledComparison::AtMost(arg) => {
            compare(value, arg).map_or(false, |o| o != std::cmp::Ordering::Greater)
        }
        CompiledComparison::MultiSelectMatch(args) => match value {
            AttributeValue::List(values) => values.iter().any(|v| args.contains(v)),
            AttributeValue::Text(v) => args.contains(v),
            _ => false,
        },
    }
}

fn equals(value: &AttributeValue, arg: &TypedValue) -> bool {
    match (value, arg) {
        (AttributeValue::Number(v), TypedValue::Number(a)) => v == a,
        (AttributeValue::Text(v), TypedValue::Text(a)) => v == a,
        (AttributeValue::Date(v), TypedValue::Date(a)) => v == a,
        (AttributeValue::Bool(v), TypedValue::Bool(a)) => v == a,
        _ => false,
    }
}

fn compare(value: &AttributeValue, arg: &TypedValue) -> Option<std::cmp::Ordering> {
    match (value, arg) {
        (AttributeValue::Number(v), TypedValue::Number(a)) => v.partial_cmp(a),
        (AttributeValue::Date(v), TypedValue::Date(a)) => Some(v.cmp(a)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_is_type_aware_not_string_equality() {
        // "3" as text never equals 3 as a number.
        assert!(!value_matches(
            &AttributeValue::Text("3".to_string()),
            &CompiledComparison::Equals(TypedValue::Number(3.0)),
        ));
        assert!(value_matches(
            &AttributeValue::Number(3.0),
            &CompiledComparison::Equals(TypedValue::Number(3.0)),
        ));
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let cmp = CompiledComparison::Range(TypedValue::Number(2.0), TypedValue::Number(4.0));
        assert!(value_matches(&AttributeValue::Number(2.0), &cmp));
        assert!(value_matches(&AttributeValue::Number(4.0), &cmp));
        assert!(!value_matches(&AttributeValue::Number(4.5), &cmp));
        assert!(!value_matches(&AttributeValue::Number(1.9), &cmp));
    }

    #[test]
    fn multi_select_match_intersects() {
        let cmp = CompiledComparison::MultiSelectMatch(vec![
            "SEEING".to_string(),
            "HEARING".to_string(),
        ]);
        assert!(value_matches(
            &AttributeValue::List(vec!["WALKING".to_string(), "HEARING".to_string()]),
            &cmp,
        ));
        assert!(!value_matches(
            &AttributeValue::List(vec!["WALKING".to_string()]),
            &cmp,
        ));
        // Single-valued enum compares as a one-element set.
        assert!(value_matches(&AttributeValue::Text("SEEING".to_string()), &cmp));
    }
}
