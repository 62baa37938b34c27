//! Per-filter validation and lowering.

use chrono::NaiveDate;

use targeting_core::ast::age::MAX_AGE_YEARS;
use targeting_core::ast::{CompiledComparison, CompiledFilter, FieldBinding, TypedValue};
use targeting_core::criteria::{ComparisonMethod, FlexFieldClassification, RawFilter};
use targeting_core::errors::{FilterLocation, ValidationError};
use targeting_core::fields::{
    FieldDescriptor, FieldRegistry, FieldScope, FieldStorage, ValueType,
};

/// Validate one raw filter and lower it to a compiled filter.
///
/// `scope` is where the filter sits: household filters demand
/// household-scoped fields, member-block filters demand individual-scoped
/// fields.
pub fn compile_filter(
    raw: &RawFilter,
    location: FilterLocation,
    scope: FieldScope,
    registry: &FieldRegistry,
) -> Result<CompiledFilter, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let Some(descriptor) = registry.resolve(&raw.field_name) else {
        return Err(vec![ValidationError::UnknownField {
            location,
            field_name: raw.field_name.clone(),
        }]);
    };

    if descriptor.scope != scope {
        errors.push(ValidationError::ClassificationMismatch {
            location,
            field_name: raw.field_name.clone(),
            actual: format!("{}-scoped {}", scope_str(descriptor.scope), descriptor.storage.as_str()),
            declared: format!("a {}-level filter", scope_str(scope)),
        });
    }

    if !classification_matches(descriptor.storage, raw.flex_field_classification) {
        errors.push(ValidationError::ClassificationMismatch {
            location,
            field_name: raw.field_name.clone(),
            actual: descriptor.storage.as_str().to_string(),
            declared: raw.flex_field_classification.as_str().to_string(),
        });
    }

    let round = validate_round(raw, &descriptor, location, &mut errors);

    let comparison = match lower_comparison(raw, &descriptor, location) {
        Ok(c) => Some(c),
        Err(mut e) => {
            errors.append(&mut e);
            None
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    // All checks passed; errors empty implies comparison lowered.
    let comparison = comparison.expect("comparison lowered when no validation errors");
    let binding = bind_field(&descriptor, round);

    Ok(CompiledFilter {
        binding,
        comparison,
    })
}

fn scope_str(scope: FieldScope) -> &'static str {
    match scope {
        FieldScope::Household => "household",
        FieldScope::Individual => "individual",
    }
}

fn classification_matches(storage: FieldStorage, declared: FlexFieldClassification) -> bool {
    matches!(
        (storage, declared),
        (FieldStorage::Core, FlexFieldClassification::Core)
            | (FieldStorage::Custom, FlexFieldClassification::Custom)
            | (FieldStorage::Periodic, FlexFieldClassification::Periodic)
    )
}

/// For periodic fields, `round_number` must be present and within
/// `1..=rounds`. Non-periodic fields ignore a stray round number.
fn validate_round(
    raw: &RawFilter,
    descriptor: &FieldDescriptor,
    location: FilterLocation,
    errors: &mut Vec<ValidationError>,
) -> u32 {
    if descriptor.storage != FieldStorage::Periodic {
        return 0;
    }
    let rounds = descriptor.rounds.unwrap_or(0);
    match raw.round_number {
        Some(round) if round >= 1 && round <= rounds => round,
        other => {
            errors.push(ValidationError::InvalidRound {
                location,
                field_name: raw.field_name.clone(),
                round: other,
                rounds,
            });
            0
        }
    }
}

fn bind_field(descriptor: &FieldDescriptor, round: u32) -> FieldBinding {
    if descriptor.virtual_source.is_some() {
        return FieldBinding::Age;
    }
    match (descriptor.storage, descriptor.scope) {
        (FieldStorage::Core, FieldScope::Household) => FieldBinding::HouseholdCore {
            field: descriptor.name.clone(),
            multi_valued: descriptor.multi_valued,
        },
        (FieldStorage::Core, FieldScope::Individual) => FieldBinding::IndividualCore {
            field: descriptor.name.clone(),
            multi_valued: descriptor.multi_valued,
        },
        (FieldStorage::Custom, FieldScope::Household) => FieldBinding::HouseholdCustom {
            key: descriptor.name.clone(),
            multi_valued: descriptor.multi_valued,
        },
        (FieldStorage::Custom, FieldScope::Individual) => FieldBinding::IndividualCustom {
            key: descriptor.name.clone(),
            multi_valued: descriptor.multi_valued,
        },
        (FieldStorage::Periodic, _) => FieldBinding::Periodic {
            key: descriptor.name.clone(),
            round,
            multi_valued: descriptor.multi_valued,
        },
    }
}

fn lower_comparison(
    raw: &RawFilter,
    descriptor: &FieldDescriptor,
    location: FilterLocation,
) -> Result<CompiledComparison, Vec<ValidationError>> {
    let arity_error = |message: String| {
        vec![ValidationError::ArgumentArityMismatch {
            location,
            field_name: raw.field_name.clone(),
            message,
        }]
    };
    let type_error = |message: String| {
        vec![ValidationError::ArgumentTypeMismatch {
            location,
            field_name: raw.field_name.clone(),
            message,
        }]
    };

    match raw.comparison_method {
        ComparisonMethod::Equals => {
            if raw.arguments.len() != 1 {
                return Err(arity_error(format!(
                    "EQUALS expects exactly 1 argument, got {}",
                    raw.arguments.len()
                )));
            }
            let value = convert_argument(&raw.arguments[0], descriptor)
                .map_err(|m| type_error(m))?;
            Ok(CompiledComparison::Equals(value))
        }
        ComparisonMethod::Range => {
            if raw.arguments.len() != 2 {
                return Err(arity_error(format!(
                    "RANGE expects exactly 2 arguments, got {}",
                    raw.arguments.len()
                )));
            }
            if !descriptor.is_orderable() {
                return Err(type_error(format!(
                    "RANGE is not applicable to a {} field",
                    value_type_str(descriptor.value_type)
                )));
            }
            let lo = convert_argument(&raw.arguments[0], descriptor).map_err(|m| type_error(m))?;
            let hi = convert_argument(&raw.arguments[1], descriptor).map_err(|m| type_error(m))?;
            if bounds_inverted(&lo, &hi) {
                return Err(type_error(
                    "RANGE lower bound exceeds upper bound".to_string(),
                ));
            }
            Ok(CompiledComparison::Range(lo, hi))
        }
        ComparisonMethod::GreaterThan | ComparisonMethod::LessThan => {
            if raw.arguments.len() != 1 {
                return Err(arity_error(format!(
                    "{} expects exactly 1 argument, got {}",
                    raw.comparison_method.as_str(),
                    raw.arguments.len()
                )));
            }
            if !descriptor.is_orderable() {
                return Err(type_error(format!(
                    "{} requires a numeric or date field",
                    raw.comparison_method.as_str()
                )));
            }
            let value = convert_argument(&raw.arguments[0], descriptor)
                .map_err(|m| type_error(m))?;
            Ok(match raw.comparison_method {
                ComparisonMethod::GreaterThan => CompiledComparison::AtLeast(value),
                _ => CompiledComparison::AtMost(value),
            })
        }
        ComparisonMethod::MultiSelectMatch => {
            if raw.arguments.is_empty() {
                return Err(arity_error(
                    "MULTI_SELECT_MATCH expects at least 1 argument".to_string(),
                ));
            }
            if !matches!(
                descriptor.value_type,
                ValueType::Enum | ValueType::MultiEnum | ValueType::String
            ) {
                return Err(type_error(format!(
                    "MULTI_SELECT_MATCH is not applicable to a {} field",
                    value_type_str(descriptor.value_type)
                )));
            }
            let mut values = Vec::with_capacity(raw.arguments.len());
            for arg in &raw.arguments {
                let Some(s) = arg.as_str() else {
                    return Err(type_error(format!(
                        "MULTI_SELECT_MATCH argument `{arg}` is not a string"
                    )));
                };
                if let Some(choices) = &descriptor.choices {
                    if !choices.iter().any(|c| c == s) {
                        return Err(type_error(format!(
                            "`{s}` is not an admissible value for `{}`",
                            raw.field_name
                        )));
                    }
                }
                values.push(s.to_string());
            }
            Ok(CompiledComparison::MultiSelectMatch(values))
        }
    }
}

fn bounds_inverted(lo: &TypedValue, hi: &TypedValue) -> bool {
    match (lo, hi) {
        (TypedValue::Number(a), TypedValue::Number(b)) => a > b,
        (TypedValue::Date(a), TypedValue::Date(b)) => a > b,
        _ => false,
    }
}

fn value_type_str(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::String => "string",
        ValueType::Number => "number",
        ValueType::Date => "date",
        ValueType::Bool => "bool",
        ValueType::Enum => "enum",
        ValueType::MultiEnum => "multi-enum",
    }
}

/// Convert a JSON argument to a typed value matching the field's declared
/// type. Enum arguments are additionally checked against the field's
/// admissible choices.
fn convert_argument(
    arg: &serde_json::Value,
    descriptor: &FieldDescriptor,
) -> Result<TypedValue, String> {
    match descriptor.value_type {
        ValueType::Number => {
            let n = arg
                .as_f64()
                .ok_or_else(|| format!("`{arg}` is not a number"))?;
            if descriptor.virtual_source.is_some() {
                if n < 0.0 || n.fract() != 0.0 {
                    return Err(format!(
                        "`{arg}` is not a whole non-negative number of years"
                    ));
                }
                if n > f64::from(MAX_AGE_YEARS) {
                    return Err(format!(
                        "`{arg}` exceeds the maximum supported age of {MAX_AGE_YEARS} years"
                    ));
                }
            }
            Ok(TypedValue::Number(n))
        }
        ValueType::Date => {
            let s = arg
                .as_str()
                .ok_or_else(|| format!("`{arg}` is not a date string"))?;
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| format!("`{s}` is not a valid ISO date"))?;
            Ok(TypedValue::Date(date))
        }
        ValueType::Bool => {
            let b = arg
                .as_bool()
                .ok_or_else(|| format!("`{arg}` is not a boolean"))?;
            Ok(TypedValue::Bool(b))
        }
        ValueType::String => {
            let s = arg
                .as_str()
                .ok_or_else(|| format!("`{arg}` is not a string"))?;
            Ok(TypedValue::Text(s.to_string()))
        }
        ValueType::Enum | ValueType::MultiEnum => {
            let s = arg
                .as_str()
                .ok_or_else(|| format!("`{arg}` is not a string"))?;
            if let Some(choices) = &descriptor.choices {
                if !choices.iter().any(|c| c == s) {
                    return Err(format!(
                        "`{s}` is not an admissible value for `{}`",
                        descriptor.name
                    ));
                }
            }
            Ok(TypedValue::Text(s.to_string()))
        }
    }
}
