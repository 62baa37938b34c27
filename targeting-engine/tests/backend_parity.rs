//! Reference vs push-down parity: both backends must report identical
//! membership, witnesses, and counts for the same criteria and population.

mod common;

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use common::*;
use targeting_core::config::CompilePolicy;
use targeting_core::criteria::{
    ComparisonMethod, FlexFieldClassification, RawBlock, RawCriteria, RawRule,
};
use targeting_core::fields::{
    FieldDescriptor, FieldRegistry, FieldScope, FieldStorage, StaticFieldSource, ValueType,
};
use targeting_core::model::{AttributeValue, CollectorRole, Household};
use targeting_core::traits::{Evaluator, HouseholdMatch};
use targeting_engine::{compile, InMemoryPopulation, ReferenceEvaluator};
use targeting_storage::{PopulationDb, PushdownEvaluator};

fn storage_backend(households: &[Household]) -> PushdownEvaluator {
    let db = PopulationDb::open_in_memory().expect("in-memory db");
    db.with_writer(|conn| {
        for hh in households {
            targeting_storage::queries::households::insert_household(conn, hh)?;
        }
        Ok(())
    })
    .expect("population load");
    PushdownEvaluator::new(Arc::new(db))
}

fn assert_parity(
    raw: &RawCriteria,
    registry: &FieldRegistry,
    households: Vec<Household>,
) -> Vec<HouseholdMatch> {
    let compiled = compile(raw, registry, CompilePolicy::default()).expect("compiles");
    let pushdown = storage_backend(&households);
    let reference = ReferenceEvaluator::new(Arc::new(InMemoryPopulation::new(households)));
    let when = date("2024-06-15");

    let from_reference = reference
        .evaluate(&compiled, when)
        .unwrap()
        .collect_all(3)
        .unwrap();
    let from_pushdown = pushdown
        .evaluate(&compiled, when)
        .unwrap()
        .collect_all(3)
        .unwrap();

    assert_eq!(from_reference, from_pushdown);
    assert_eq!(
        reference.count_only(&compiled, when).unwrap(),
        pushdown.count_only(&compiled, when).unwrap()
    );
    from_reference
}

fn extended_registry() -> FieldRegistry {
    let source = Arc::new(StaticFieldSource::with_core_schema());
    source.define(FieldDescriptor::scalar(
        "assistance_score",
        ValueType::Number,
        FieldStorage::Custom,
        FieldScope::Household,
    ));
    source.define(FieldDescriptor::scalar(
        "school_enrolled",
        ValueType::Bool,
        FieldStorage::Custom,
        FieldScope::Individual,
    ));
    source.define({
        let mut d = FieldDescriptor::scalar(
            "aid_programs",
            ValueType::MultiEnum,
            FieldStorage::Custom,
            FieldScope::Household,
        )
        .with_choices(&["CASH", "FOOD", "SHELTER"]);
        d.multi_valued = true;
        d
    });
    source.define(
        FieldDescriptor::scalar(
            "muac_score",
            ValueType::Number,
            FieldStorage::Periodic,
            FieldScope::Individual,
        )
        .with_rounds(2),
    );
    FieldRegistry::new(source)
}

#[test]
fn core_filters_and_blocks_agree() {
    let households = vec![
        household(
            "HH-1",
            vec![
                individual(IndividualSpec {
                    id: "IND-1A",
                    is_head: true,
                    sex: "MALE",
                    marital_status: "MARRIED",
                    ..Default::default()
                }),
                individual(IndividualSpec { id: "IND-1B", ..Default::default() }),
            ],
        ),
        household(
            "HH-2",
            vec![individual(IndividualSpec {
                id: "IND-2A",
                is_head: true,
                sex: "FEMALE",
                ..Default::default()
            })],
        ),
    ];

    let raw = criteria(vec![RawRule {
        household_filters: vec![core_filter(
            "size",
            ComparisonMethod::GreaterThan,
            vec![json!(1)],
        )],
        individual_blocks: vec![RawBlock {
            filters: vec![core_filter("sex", ComparisonMethod::Equals, vec![json!("MALE")])],
            target_only_head_of_household: true,
        }],
        ..Default::default()
    }]);

    let matches = assert_parity(&raw, &registry(), households);
    assert_eq!(
        matches,
        vec![HouseholdMatch {
            household_id: "HH-1".to_string(),
            witness: Some("IND-1A".to_string()),
        }]
    );
}

#[test]
fn age_bounds_agree_across_backends() {
    let mut households = Vec::new();
    for (i, birth) in ["2002-06-14", "2002-06-15", "2002-06-16", "1997-06-15", "1997-06-16"]
        .into_iter()
        .enumerate()
    {
        let id = format!("HH-{i}");
        let mut hh = household(&id, Vec::new());
        hh.members.push({
            let mut m = individual(IndividualSpec { ..Default::default() });
            m.id = format!("IND-{i}");
            m.birth_date = date(birth);
            m
        });
        hh.size = 1;
        households.push(hh);
    }

    let raw = criteria(vec![block_rule(vec![RawBlock {
        filters: vec![core_filter(
            "age",
            ComparisonMethod::Range,
            vec![json!(22), json!(26)],
        )],
        ..Default::default()
    }])]);

    let matches = assert_parity(&raw, &registry(), households);
    let matched: Vec<&str> = matches.iter().map(|m| m.household_id.as_str()).collect();
    // Born 1997-06-16 is still 26 on 2024-06-15; born 1997-06-15 turned
    // 27 that day and born 2002-06-16 is still 21.
    assert_eq!(matched, vec!["HH-0", "HH-1", "HH-4"]);
}

#[test]
fn custom_attribute_filters_agree() {
    let registry = extended_registry();
    let mut rich = household("HH-1", vec![individual(IndividualSpec { id: "IND-1", ..Default::default() })]);
    rich.attributes.insert(
        "assistance_score".to_string(),
        AttributeValue::Number(42.0),
    );
    rich.attributes.insert(
        "aid_programs".to_string(),
        AttributeValue::List(vec!["CASH".to_string(), "FOOD".to_string()]),
    );
    let mut enrolled = household("HH-2", vec![individual(IndividualSpec { id: "IND-2", ..Default::default() })]);
    enrolled.members[0]
        .attributes
        .insert("school_enrolled".to_string(), AttributeValue::Bool(true));
    let bare = household("HH-3", vec![individual(IndividualSpec { id: "IND-3", ..Default::default() })]);

    let raw = criteria(vec![
        household_rule(vec![
            filter(
                "assistance_score",
                ComparisonMethod::GreaterThan,
                vec![json!(40)],
                FlexFieldClassification::Custom,
            ),
            filter(
                "aid_programs",
                ComparisonMethod::MultiSelectMatch,
                vec![json!("FOOD"), json!("SHELTER")],
                FlexFieldClassification::Custom,
            ),
        ]),
        block_rule(vec![RawBlock {
            filters: vec![filter(
                "school_enrolled",
                ComparisonMethod::Equals,
                vec![json!(true)],
                FlexFieldClassification::Custom,
            )],
            ..Default::default()
        }]),
    ]);

    let matches = assert_parity(&raw, &registry, vec![rich, enrolled, bare]);
    let matched: Vec<&str> = matches.iter().map(|m| m.household_id.as_str()).collect();
    assert_eq!(matched, vec!["HH-1", "HH-2"]);
}

#[test]
fn periodic_rounds_agree_including_uncollected() {
    let registry = extended_registry();
    let collected = household(
        "HH-1",
        vec![with_periodic(
            individual(IndividualSpec { id: "IND-1", ..Default::default() }),
            "muac_score",
            2,
            Some(AttributeValue::Number(10.5)),
            Some("2024-05-01"),
        )],
    );
    let uncollected = household(
        "HH-2",
        vec![with_periodic(
            individual(IndividualSpec { id: "IND-2", ..Default::default() }),
            "muac_score",
            2,
            None,
            None,
        )],
    );
    let wrong_round = household(
        "HH-3",
        vec![with_periodic(
            individual(IndividualSpec { id: "IND-3", ..Default::default() }),
            "muac_score",
            1,
            Some(AttributeValue::Number(10.5)),
            Some("2024-01-15"),
        )],
    );

    let mut periodic_filter = filter(
        "muac_score",
        ComparisonMethod::LessThan,
        vec![json!(11.0)],
        FlexFieldClassification::Periodic,
    );
    periodic_filter.round_number = Some(2);
    let raw = criteria(vec![block_rule(vec![RawBlock {
        filters: vec![periodic_filter],
        ..Default::default()
    }])]);

    let matches = assert_parity(&raw, &registry, vec![collected, uncollected, wrong_round]);
    let matched: Vec<&str> = matches.iter().map(|m| m.household_id.as_str()).collect();
    assert_eq!(matched, vec!["HH-1"]);
}

#[test]
fn multi_select_on_core_multi_enum_agrees() {
    let mut observed = household(
        "HH-1",
        vec![individual(IndividualSpec { id: "IND-1", ..Default::default() })],
    );
    observed.members[0].observed_disabilities =
        vec!["WALKING".to_string(), "SEEING".to_string()];
    let other = household(
        "HH-2",
        vec![individual(IndividualSpec { id: "IND-2", ..Default::default() })],
    );

    let raw = criteria(vec![block_rule(vec![RawBlock {
        filters: vec![core_filter(
            "observed_disabilities",
            ComparisonMethod::MultiSelectMatch,
            vec![json!("SEEING"), json!("HEARING")],
        )],
        ..Default::default()
    }])]);

    let matches = assert_parity(&raw, &registry(), vec![observed, other]);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].household_id, "HH-1");
}

#[test]
fn inclusion_lists_agree() {
    let households = vec![
        household("HH-1", vec![individual(IndividualSpec { id: "IND-1", ..Default::default() })]),
        household("HH-2", vec![individual(IndividualSpec { id: "IND-2", ..Default::default() })]),
        household("HH-3", vec![individual(IndividualSpec { id: "IND-3", ..Default::default() })]),
    ];

    let raw = criteria(vec![RawRule {
        household_ids: vec!["HH-3".to_string()],
        individual_ids: vec!["IND-1".to_string()],
        household_filters: vec![core_filter(
            "size",
            ComparisonMethod::GreaterThan,
            vec![json!(5)],
        )],
        ..Default::default()
    }]);

    let matches = assert_parity(&raw, &registry(), households);
    let matched: Vec<&str> = matches.iter().map(|m| m.household_id.as_str()).collect();
    assert_eq!(matched, vec!["HH-1", "HH-3"]);
}

fn arb_individual(seq: usize) -> impl Strategy<Value = targeting_core::model::Individual> {
    (
        prop::sample::select(vec!["MALE", "FEMALE"]),
        prop::sample::select(vec!["SINGLE", "MARRIED", "WIDOWED"]),
        1950i32..2023,
        any::<bool>(),
        prop::sample::select(vec![
            CollectorRole::None,
            CollectorRole::Primary,
            CollectorRole::Alternate,
        ]),
    )
        .prop_map(move |(sex, marital, birth_year, is_head, role)| {
            let mut m = individual(IndividualSpec {
                is_head,
                collector_role: role,
                ..Default::default()
            });
            m.id = format!("IND-{seq:03}-{sex}-{birth_year}");
            m.sex = sex.to_string();
            m.marital_status = marital.to_string();
            m.birth_date = date(&format!("{birth_year}-03-01"));
            m
        })
}

fn arb_household(seq: usize) -> impl Strategy<Value = Household> {
    (
        prop::collection::vec(arb_individual(seq), 1..5),
        prop::sample::select(vec!["IDP", "REFUGEE", "HOST", "RETURNEE"]),
    )
        .prop_map(move |(mut members, residence)| {
            for (i, m) in members.iter_mut().enumerate() {
                m.id = format!("{}-{i}", m.id);
            }
            let mut hh = household(&format!("HH-{seq:03}"), members);
            hh.residence_status = residence.to_string();
            hh
        })
}

fn arb_population() -> impl Strategy<Value = Vec<Household>> {
    (1usize..8).prop_flat_map(|n| {
        (0..n).map(arb_household).collect::<Vec<_>>()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Backends agree on a mixed rule over arbitrary small populations.
    #[test]
    fn backends_agree_on_random_populations(households in arb_population()) {
        let raw = criteria(vec![
            RawRule {
                household_filters: vec![core_filter(
                    "residence_status",
                    ComparisonMethod::Equals,
                    vec![json!("REFUGEE")],
                )],
                individual_blocks: vec![RawBlock {
                    filters: vec![core_filter(
                        "age",
                        ComparisonMethod::Range,
                        vec![json!(18), json!(59)],
                    )],
                    ..Default::default()
                }],
                ..Default::default()
            },
            RawRule {
                collector_blocks: vec![RawBlock {
                    filters: vec![core_filter(
                        "sex",
                        ComparisonMethod::Equals,
                        vec![json!("FEMALE")],
                    )],
                    ..Default::default()
                }],
                ..Default::default()
            },
        ]);

        assert_parity(&raw, &registry(), households);
    }
}
