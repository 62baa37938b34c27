//! End-to-end reference evaluation: compile a raw tree, evaluate it over
//! an in-memory population, check membership and witnesses.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::*;
use targeting_core::config::{CompilePolicy, InclusionPolicy};
use targeting_core::criteria::{ComparisonMethod, RawBlock, RawCriteria, RawRule};
use targeting_core::model::{AttributeValue, CollectorRole};
use targeting_core::traits::Evaluator;
use targeting_engine::{compile, InMemoryPopulation, ReferenceEvaluator};

fn evaluate(
    raw: &RawCriteria,
    population: InMemoryPopulation,
    policy: CompilePolicy,
) -> Vec<(String, Option<String>)> {
    let compiled = compile(raw, &registry(), policy).expect("criteria should compile");
    let evaluator = ReferenceEvaluator::new(Arc::new(population));
    evaluator
        .evaluate(&compiled, date("2024-06-15"))
        .expect("evaluation should succeed")
        .collect_all(10)
        .expect("cursor should drain")
        .into_iter()
        .map(|m| (m.household_id, m.witness))
        .collect()
}

fn ids(matches: &[(String, Option<String>)]) -> Vec<&str> {
    matches.iter().map(|(id, _)| id.as_str()).collect()
}

#[test]
fn household_filter_selects_by_size() {
    let population = InMemoryPopulation::new(vec![
        household("HH-1", vec![individual(Default::default())]),
        household(
            "HH-2",
            vec![
                individual(IndividualSpec { id: "IND-2A", ..Default::default() }),
                individual(IndividualSpec { id: "IND-2B", ..Default::default() }),
                individual(IndividualSpec { id: "IND-2C", ..Default::default() }),
            ],
        ),
    ]);
    let raw = criteria(vec![household_rule(vec![core_filter(
        "size",
        ComparisonMethod::Equals,
        vec![json!(3)],
    )])]);

    let matches = evaluate(&raw, population, CompilePolicy::default());
    assert_eq!(ids(&matches), vec!["HH-2"]);
}

/// A member block needs one member satisfying all its filters at once;
/// one married plus one male member is not one married male.
#[test]
fn block_filters_must_hold_on_the_same_member() {
    let split = household(
        "HH-1",
        vec![
            individual(IndividualSpec {
                id: "IND-1A",
                sex: "MALE",
                marital_status: "SINGLE",
                ..Default::default()
            }),
            individual(IndividualSpec {
                id: "IND-1B",
                sex: "FEMALE",
                marital_status: "MARRIED",
                ..Default::default()
            }),
        ],
    );
    let combined = household(
        "HH-2",
        vec![individual(IndividualSpec {
            id: "IND-2A",
            sex: "MALE",
            marital_status: "MARRIED",
            ..Default::default()
        })],
    );
    let population = InMemoryPopulation::new(vec![split, combined]);

    let raw = criteria(vec![block_rule(vec![RawBlock {
        filters: vec![
            core_filter("sex", ComparisonMethod::Equals, vec![json!("MALE")]),
            core_filter("marital_status", ComparisonMethod::Equals, vec![json!("MARRIED")]),
        ],
        ..Default::default()
    }])]);

    let matches = evaluate(&raw, population, CompilePolicy::default());
    assert_eq!(matches, vec![("HH-2".to_string(), Some("IND-2A".to_string()))]);
}

/// Two blocks may be satisfied by different members of the household.
#[test]
fn different_blocks_may_use_different_members() {
    let population = InMemoryPopulation::new(vec![household(
        "HH-1",
        vec![
            individual(IndividualSpec { id: "IND-1A", sex: "MALE", ..Default::default() }),
            individual(IndividualSpec { id: "IND-1B", sex: "FEMALE", ..Default::default() }),
        ],
    )]);

    let raw = criteria(vec![block_rule(vec![
        RawBlock {
            filters: vec![core_filter("sex", ComparisonMethod::Equals, vec![json!("MALE")])],
            ..Default::default()
        },
        RawBlock {
            filters: vec![core_filter("sex", ComparisonMethod::Equals, vec![json!("FEMALE")])],
            ..Default::default()
        },
    ])]);

    let matches = evaluate(&raw, population, CompilePolicy::default());
    // Witness comes from the first block.
    assert_eq!(matches, vec![("HH-1".to_string(), Some("IND-1A".to_string()))]);
}

/// Rules are OR'd with set semantics: a household satisfying both rules
/// appears once.
#[test]
fn rule_union_deduplicates() {
    let population = InMemoryPopulation::new(vec![
        household("HH-1", vec![individual(IndividualSpec { id: "IND-1", ..Default::default() })]),
        household(
            "HH-2",
            vec![
                individual(IndividualSpec { id: "IND-2A", ..Default::default() }),
                individual(IndividualSpec { id: "IND-2B", ..Default::default() }),
            ],
        ),
    ]);

    let raw = criteria(vec![
        household_rule(vec![core_filter(
            "size",
            ComparisonMethod::GreaterThan,
            vec![json!(1)],
        )]),
        household_rule(vec![core_filter(
            "residence_status",
            ComparisonMethod::Equals,
            vec![json!("HOST")],
        )]),
    ]);

    let matches = evaluate(&raw, population, CompilePolicy::default());
    assert_eq!(ids(&matches), vec!["HH-1", "HH-2"]);
}

#[test]
fn head_only_block_ignores_other_members() {
    let population = InMemoryPopulation::new(vec![household(
        "HH-1",
        vec![
            individual(IndividualSpec {
                id: "IND-1A",
                is_head: true,
                sex: "MALE",
                ..Default::default()
            }),
            individual(IndividualSpec { id: "IND-1B", sex: "FEMALE", ..Default::default() }),
        ],
    )]);

    let raw = criteria(vec![block_rule(vec![RawBlock {
        filters: vec![core_filter("sex", ComparisonMethod::Equals, vec![json!("FEMALE")])],
        target_only_head_of_household: true,
    }])]);

    let matches = evaluate(&raw, population, CompilePolicy::default());
    assert!(matches.is_empty());
}

#[test]
fn collector_block_restricts_to_collectors() {
    let population = InMemoryPopulation::new(vec![household(
        "HH-1",
        vec![
            individual(IndividualSpec { id: "IND-1A", sex: "FEMALE", ..Default::default() }),
            individual(IndividualSpec {
                id: "IND-1B",
                sex: "MALE",
                collector_role: CollectorRole::Primary,
                ..Default::default()
            }),
        ],
    )]);

    let raw = criteria(vec![RawRule {
        collector_blocks: vec![RawBlock {
            filters: vec![core_filter("sex", ComparisonMethod::Equals, vec![json!("FEMALE")])],
            ..Default::default()
        }],
        ..Default::default()
    }]);

    // The only FEMALE member holds no collector role.
    let matches = evaluate(&raw, population, CompilePolicy::default());
    assert!(matches.is_empty());
}

/// An uncollected periodic round never matches, whether the round's value
/// is missing or the row is absent entirely.
#[test]
fn uncollected_periodic_round_never_matches() {
    let source = Arc::new(targeting_core::fields::StaticFieldSource::with_core_schema());
    source.define(
        targeting_core::fields::FieldDescriptor::scalar(
            "muac_score",
            targeting_core::fields::ValueType::Number,
            targeting_core::fields::FieldStorage::Periodic,
            targeting_core::fields::FieldScope::Individual,
        )
        .with_rounds(2),
    );
    let registry = targeting_core::fields::FieldRegistry::new(source);

    let collected = with_periodic(
        individual(IndividualSpec { id: "IND-1", ..Default::default() }),
        "muac_score",
        1,
        Some(AttributeValue::Number(10.0)),
        Some("2024-03-01"),
    );
    let uncollected = with_periodic(
        individual(IndividualSpec { id: "IND-2", ..Default::default() }),
        "muac_score",
        1,
        None,
        None,
    );
    let population = InMemoryPopulation::new(vec![
        household("HH-1", vec![collected]),
        household("HH-2", vec![uncollected]),
        household("HH-3", vec![individual(IndividualSpec { id: "IND-3", ..Default::default() })]),
    ]);

    let mut periodic_filter = filter(
        "muac_score",
        ComparisonMethod::LessThan,
        vec![json!(11.5)],
        targeting_core::criteria::FlexFieldClassification::Periodic,
    );
    periodic_filter.round_number = Some(1);
    let raw = criteria(vec![block_rule(vec![RawBlock {
        filters: vec![periodic_filter],
        ..Default::default()
    }])]);

    let compiled = compile(&raw, &registry, CompilePolicy::default()).unwrap();
    let evaluator = ReferenceEvaluator::new(Arc::new(population));
    let matches = evaluator
        .evaluate(&compiled, date("2024-06-15"))
        .unwrap()
        .collect_all(10)
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].household_id, "HH-1");
}

/// Age RANGE [22, 26] evaluated at 2024-06-15: a member born 2000-06-15
/// turned 24 that day and is in; one born 2004-06-16 is still 19.
#[test]
fn age_range_matches_whole_years_at_evaluation_date() {
    let population = InMemoryPopulation::new(vec![
        household(
            "HH-1",
            vec![individual(IndividualSpec {
                id: "IND-1",
                birth_date: "2000-06-15",
                ..Default::default()
            })],
        ),
        household(
            "HH-2",
            vec![individual(IndividualSpec {
                id: "IND-2",
                birth_date: "2004-06-16",
                ..Default::default()
            })],
        ),
    ]);

    let raw = criteria(vec![block_rule(vec![RawBlock {
        filters: vec![core_filter(
            "age",
            ComparisonMethod::Range,
            vec![json!(22), json!(26)],
        )],
        ..Default::default()
    }])]);

    let matches = evaluate(&raw, population, CompilePolicy::default());
    assert_eq!(ids(&matches), vec!["HH-1"]);
}

/// Under the default policy an explicitly listed household is included
/// even when it fails every filter, with no witness.
#[test]
fn inclusion_list_bypasses_filters_by_default() {
    let population = InMemoryPopulation::new(vec![
        household("HH-1", vec![individual(IndividualSpec { id: "IND-1", ..Default::default() })]),
        household("HH-2", vec![individual(IndividualSpec { id: "IND-2", ..Default::default() })]),
    ]);

    let raw = criteria(vec![RawRule {
        household_ids: vec!["HH-2".to_string()],
        household_filters: vec![core_filter("size", ComparisonMethod::GreaterThan, vec![json!(5)])],
        ..Default::default()
    }]);

    let matches = evaluate(&raw, population, CompilePolicy::default());
    assert_eq!(matches, vec![("HH-2".to_string(), None)]);
}

/// Under RequireFilters the same listed household must also satisfy the
/// filters, so it drops out.
#[test]
fn inclusion_list_can_be_required_to_pass_filters() {
    let population = InMemoryPopulation::new(vec![household(
        "HH-2",
        vec![individual(IndividualSpec { id: "IND-2", ..Default::default() })],
    )]);

    let raw = criteria(vec![RawRule {
        household_ids: vec!["HH-2".to_string()],
        household_filters: vec![core_filter("size", ComparisonMethod::GreaterThan, vec![json!(5)])],
        ..Default::default()
    }]);

    let policy = CompilePolicy {
        inclusion: InclusionPolicy::RequireFilters,
        ..Default::default()
    };
    let matches = evaluate(&raw, population, policy);
    assert!(matches.is_empty());
}

/// Listing an individual pulls in that individual's household.
#[test]
fn individual_inclusion_targets_the_household() {
    let population = InMemoryPopulation::new(vec![
        household("HH-1", vec![individual(IndividualSpec { id: "IND-1", ..Default::default() })]),
        household("HH-2", vec![individual(IndividualSpec { id: "IND-2", ..Default::default() })]),
    ]);

    let raw = criteria(vec![RawRule {
        individual_ids: vec!["IND-2".to_string()],
        ..Default::default()
    }]);

    let matches = evaluate(&raw, population, CompilePolicy::default());
    assert_eq!(ids(&matches), vec!["HH-2"]);
}

#[test]
fn count_only_agrees_with_evaluate() {
    let population = InMemoryPopulation::new(vec![
        household("HH-1", vec![individual(IndividualSpec { id: "IND-1", ..Default::default() })]),
        household(
            "HH-2",
            vec![
                individual(IndividualSpec { id: "IND-2A", ..Default::default() }),
                individual(IndividualSpec { id: "IND-2B", ..Default::default() }),
            ],
        ),
    ]);
    // LESS_THAN is inclusive, so the bound must sit below the larger
    // household's size.
    let raw = criteria(vec![household_rule(vec![core_filter(
        "size",
        ComparisonMethod::LessThan,
        vec![json!(1)],
    )])]);
    let compiled = compile(&raw, &registry(), CompilePolicy::default()).unwrap();
    let evaluator = ReferenceEvaluator::new(Arc::new(population));

    let result = evaluator.evaluate(&compiled, date("2024-06-15")).unwrap();
    assert_eq!(result.total_count, 1);
    assert_eq!(evaluator.count_only(&compiled, date("2024-06-15")).unwrap(), 1);
}

/// The one-call pipeline materializes on success and folds validation
/// failures into the boundary error type.
#[test]
fn pipeline_materializes_or_surfaces_the_error_batch() {
    use targeting_core::errors::EngineError;
    use targeting_engine::build_population;

    let population = Arc::new(InMemoryPopulation::new(vec![
        household("HH-1", vec![individual(IndividualSpec { id: "IND-1", ..Default::default() })]),
        household(
            "HH-2",
            vec![
                individual(IndividualSpec { id: "IND-2A", ..Default::default() }),
                individual(IndividualSpec { id: "IND-2B", ..Default::default() }),
            ],
        ),
    ]));
    let evaluator = ReferenceEvaluator::new(population.clone());

    let raw = criteria(vec![household_rule(vec![core_filter(
        "size",
        ComparisonMethod::Equals,
        vec![json!(2)],
    )])]);
    let built = build_population(
        &raw,
        &registry(),
        CompilePolicy::default(),
        &evaluator,
        population.as_ref(),
        date("2024-06-15"),
        10,
    )
    .unwrap();
    assert_eq!(built.households, vec!["HH-2".to_string()]);
    assert_eq!(built.household_count, 1);
    assert_eq!(built.individual_count, 2);

    let bad = criteria(vec![household_rule(vec![core_filter(
        "no_such_field",
        ComparisonMethod::Equals,
        vec![json!(1)],
    )])]);
    let err = build_population(
        &bad,
        &registry(),
        CompilePolicy::default(),
        &evaluator,
        population.as_ref(),
        date("2024-06-15"),
        10,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Validation(ref errors) if errors.len() == 1));
}
