//! AST to SQL lowering for the push-down backend.
//!
//! Produces one parameterized WHERE clause per compiled criteria plus a
//! witness expression for the select list. The generated predicates must
//! agree with the reference evaluator on every household, so each lowering
//! rule here mirrors the corresponding arm of the in-memory interpreter:
//! inclusive bounds, type-affine comparisons, existential member blocks
//! over the same candidate sets, and `NULL`/uncollected values that never
//! match.

use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;

use targeting_core::ast::{
    age, CandidateSet, CompiledComparison, CompiledCriteria, CompiledFilter, CompiledRule,
    FieldBinding, InclusionList, MemberBlock, TypedValue,
};
use targeting_core::config::InclusionPolicy;
use targeting_core::errors::StorageError;

/// A SQL snippet with its bind parameters in placeholder order.
#[derive(Debug, Default, Clone)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl SqlFragment {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn bind(&mut self, value: SqlValue) {
        self.sql.push('?');
        self.params.push(value);
    }

    fn absorb(&mut self, other: SqlFragment) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }
}

/// The WHERE clause over `households h`: an OR across rule predicates.
pub fn criteria_where(
    criteria: &CompiledCriteria,
    evaluation_date: NaiveDate,
) -> Result<SqlFragment, StorageError> {
    if criteria.rules.is_empty() {
        return Ok(SqlFragment::new("0"));
    }
    let mut out = SqlFragment::default();
    for (i, rule) in criteria.rules.iter().enumerate() {
        if i > 0 {
            out.push(" OR ");
        }
        out.push("(");
        out.absorb(rule_matched(
            rule,
            criteria.inclusion_policy,
            evaluation_date,
        )?);
        out.push(")");
    }
    Ok(out)
}

/// The witness column for the select list: a CASE walking rules in order,
/// yielding the first satisfied rule's first-block minimum member id. A
/// household matched only through an inclusion list gets NULL, same as the
/// reference backend.
pub fn witness_case(
    criteria: &CompiledCriteria,
    evaluation_date: NaiveDate,
) -> Result<SqlFragment, StorageError> {
    // `CASE END` with zero arms is a syntax error.
    if criteria.rules.is_empty() {
        return Ok(SqlFragment::new("NULL"));
    }
    let mut out = SqlFragment::new("CASE");
    for rule in &criteria.rules {
        let has_filters = !rule.household_filters.is_empty() || !rule.member_blocks.is_empty();
        if has_filters {
            out.push(" WHEN ");
            out.absorb(rule_satisfied(
                rule,
                criteria.inclusion_policy,
                evaluation_date,
            )?);
            out.push(" THEN ");
            match rule.member_blocks.first() {
                Some(block) => {
                    out.push("(");
                    out.absorb(block_min_member(block, evaluation_date)?);
                    out.push(")");
                }
                None => out.push("NULL"),
            }
            if criteria.inclusion_policy == InclusionPolicy::BypassFilters {
                if let Some(list) = &rule.inclusion {
                    out.push(" WHEN ");
                    out.absorb(inclusion_hit(list));
                    out.push(" THEN NULL");
                }
            }
        } else if let Some(list) = &rule.inclusion {
            out.push(" WHEN ");
            out.absorb(inclusion_hit(list));
            out.push(" THEN NULL");
        }
    }
    out.push(" END");
    Ok(out)
}

/// Whether the household matches the rule at all, policy applied.
fn rule_matched(
    rule: &CompiledRule,
    policy: InclusionPolicy,
    evaluation_date: NaiveDate,
) -> Result<SqlFragment, StorageError> {
    let has_filters = !rule.household_filters.is_empty() || !rule.member_blocks.is_empty();
    if !has_filters {
        // Validation guarantees an inclusion list on filterless rules.
        return Ok(rule
            .inclusion
            .as_ref()
            .map(inclusion_hit)
            .unwrap_or_else(|| SqlFragment::new("0")));
    }

    let satisfied = rule_satisfied(rule, policy, evaluation_date)?;
    match (policy, &rule.inclusion) {
        (InclusionPolicy::BypassFilters, Some(list)) => {
            let mut out = SqlFragment::new("(");
            out.absorb(satisfied);
            out.push(") OR (");
            out.absorb(inclusion_hit(list));
            out.push(")");
            Ok(out)
        }
        // RequireFilters folds the inclusion check into `satisfied`.
        _ => Ok(satisfied),
    }
}

/// The conjunction of household filters and member blocks. Under
/// `RequireFilters` an attached inclusion list becomes one more conjunct.
fn rule_satisfied(
    rule: &CompiledRule,
    policy: InclusionPolicy,
    evaluation_date: NaiveDate,
) -> Result<SqlFragment, StorageError> {
    let mut out = SqlFragment::default();
    let mut first = true;
    let mut sep = |out: &mut SqlFragment| {
        if !first {
            out.push(" AND ");
        }
        first = false;
    };

    for filter in &rule.household_filters {
        sep(&mut out);
        out.push("(");
        out.absorb(household_filter_sql(filter)?);
        out.push(")");
    }
    for block in &rule.member_blocks {
        sep(&mut out);
        out.push("EXISTS (SELECT 1 FROM individuals i WHERE i.household_id = h.id");
        out.absorb(candidate_restriction(block.candidates));
        for filter in &block.filters {
            out.push(" AND (");
            out.absorb(individual_filter_sql(filter, evaluation_date)?);
            out.push(")");
        }
        out.push(")");
    }
    if policy == InclusionPolicy::RequireFilters {
        if let Some(list) = &rule.inclusion {
            sep(&mut out);
            out.push("(");
            out.absorb(inclusion_hit(list));
            out.push(")");
        }
    }
    Ok(out)
}

/// Lowest-id member of the block's candidate set passing all its filters.
fn block_min_member(
    block: &MemberBlock,
    evaluation_date: NaiveDate,
) -> Result<SqlFragment, StorageError> {
    let mut out =
        SqlFragment::new("SELECT MIN(i.id) FROM individuals i WHERE i.household_id = h.id");
    out.absorb(candidate_restriction(block.candidates));
    for filter in &block.filters {
        out.push(" AND (");
        out.absorb(individual_filter_sql(filter, evaluation_date)?);
        out.push(")");
    }
    Ok(out)
}

fn candidate_restriction(candidates: CandidateSet) -> SqlFragment {
    let mut out = SqlFragment::default();
    if candidates.head_only {
        out.push(" AND i.is_head = 1");
    }
    if candidates.collectors_only {
        out.push(" AND i.collector_role != 'NONE'");
    }
    out
}

/// Membership test against an inclusion list. Bound as single JSON array
/// parameters so list size is not limited by the bind-variable cap.
fn inclusion_hit(list: &InclusionList) -> SqlFragment {
    let mut out = SqlFragment::default();
    let mut any = false;
    if !list.household_ids.is_empty() {
        out.push("h.id IN (SELECT value FROM json_each(");
        out.bind(SqlValue::Text(ids_json(&list.household_ids)));
        out.push("))");
        any = true;
    }
    if !list.individual_ids.is_empty() {
        if any {
            out.push(" OR ");
        }
        out.push(
            "EXISTS (SELECT 1 FROM individuals i WHERE i.household_id = h.id \
             AND i.id IN (SELECT value FROM json_each(",
        );
        out.bind(SqlValue::Text(ids_json(&list.individual_ids)));
        out.push(")))");
        any = true;
    }
    if !any {
        out.push("0");
    }
    out
}

fn ids_json(ids: &[String]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

fn household_filter_sql(filter: &CompiledFilter) -> Result<SqlFragment, StorageError> {
    match &filter.binding {
        FieldBinding::HouseholdCore { field, multi_valued } => {
            let column = household_column(field)?;
            comparison_sql(&SqlFragment::new(column), &filter.comparison, *multi_valued)
        }
        FieldBinding::HouseholdCustom { key, multi_valued } => {
            let expr = json_attribute("h.attributes", key);
            comparison_sql(&expr, &filter.comparison, *multi_valued)
        }
        other => Err(StorageError::SqliteError {
            message: format!("household filter bound to member-level field: {other:?}"),
        }),
    }
}

fn individual_filter_sql(
    filter: &CompiledFilter,
    evaluation_date: NaiveDate,
) -> Result<SqlFragment, StorageError> {
    match &filter.binding {
        FieldBinding::IndividualCore { field, multi_valued } => {
            let column = individual_column(field)?;
            comparison_sql(&SqlFragment::new(column), &filter.comparison, *multi_valued)
        }
        FieldBinding::IndividualCustom { key, multi_valued } => {
            let expr = json_attribute("i.attributes", key);
            comparison_sql(&expr, &filter.comparison, *multi_valued)
        }
        FieldBinding::Periodic {
            key,
            round,
            multi_valued,
        } => {
            // Uncollected rounds have a NULL value row (or no row) and
            // never match.
            let mut out = SqlFragment::new(
                "EXISTS (SELECT 1 FROM periodic_values pv \
                 WHERE pv.individual_id = i.id AND pv.field = ",
            );
            out.bind(SqlValue::Text(key.clone()));
            out.push(" AND pv.round = ");
            out.bind(SqlValue::Integer(*round as i64));
            out.push(" AND pv.value IS NOT NULL AND (");
            out.absorb(comparison_sql(
                &SqlFragment::new("pv.value"),
                &filter.comparison,
                *multi_valued,
            )?);
            out.push("))");
            Ok(out)
        }
        FieldBinding::Age => {
            let bounds = age::birth_date_bounds(&filter.comparison, evaluation_date).ok_or_else(
                || StorageError::SqliteError {
                    message: "age filter compiled with non-numeric comparison".to_string(),
                },
            )?;
            let mut out = SqlFragment::default();
            let mut any = false;
            if let Some(min) = bounds.min {
                out.push("i.birth_date >= ");
                out.bind(SqlValue::Text(min.format("%Y-%m-%d").to_string()));
                any = true;
            }
            if let Some(max) = bounds.max {
                if any {
                    out.push(" AND ");
                }
                out.push("i.birth_date <= ");
                out.bind(SqlValue::Text(max.format("%Y-%m-%d").to_string()));
                any = true;
            }
            if !any {
                out.push("1");
            }
            Ok(out)
        }
        other => Err(StorageError::SqliteError {
            message: format!("member filter bound to household-level field: {other:?}"),
        }),
    }
}

fn household_column(field: &str) -> Result<&'static str, StorageError> {
    match field {
        "size" => Ok("h.size"),
        "residence_status" => Ok("h.residence_status"),
        "address" => Ok("h.address"),
        "registration_date" => Ok("h.registration_date"),
        _ => Err(StorageError::SqliteError {
            message: format!("no column mapping for household core field `{field}`"),
        }),
    }
}

fn individual_column(field: &str) -> Result<&'static str, StorageError> {
    match field {
        "sex" => Ok("i.sex"),
        "marital_status" => Ok("i.marital_status"),
        "birth_date" => Ok("i.birth_date"),
        "disability" => Ok("i.disability"),
        "observed_disabilities" => Ok("i.observed_disabilities"),
        _ => Err(StorageError::SqliteError {
            message: format!("no column mapping for individual core field `{field}`"),
        }),
    }
}

/// `json_extract` keeps JSON numbers and booleans as SQL numerics, so the
/// comparison affinity below lines up with the stored representation.
fn json_attribute(column: &str, key: &str) -> SqlFragment {
    let mut out = SqlFragment::new(format!("json_extract({column}, "));
    out.bind(SqlValue::Text(format!("$.{key}")));
    out.push(")");
    out
}

fn comparison_sql(
    value: &SqlFragment,
    comparison: &CompiledComparison,
    multi_valued: bool,
) -> Result<SqlFragment, StorageError> {
    let mut out = SqlFragment::default();
    match comparison {
        CompiledComparison::Equals(arg) => {
            out.absorb(value.clone());
            out.push(" = ");
            out.bind(typed_param(arg));
        }
        CompiledComparison::Range(lo, hi) => {
            out.absorb(value.clone());
            out.push(" >= ");
            out.bind(typed_param(lo));
            out.push(" AND ");
            out.absorb(value.clone());
            out.push(" <= ");
            out.bind(typed_param(hi));
        }
        CompiledComparison::AtLeast(arg) => {
            out.absorb(value.clone());
            out.push(" >= ");
            out.bind(typed_param(arg));
        }
        CompiledComparison::AtMost(arg) => {
            out.absorb(value.clone());
            out.push(" <= ");
            out.bind(typed_param(arg));
        }
        CompiledComparison::MultiSelectMatch(args) => {
            if multi_valued {
                // Stored as a JSON array: match when the sets intersect.
                out.absorb(value.clone());
                out.push(" IS NOT NULL AND EXISTS (SELECT 1 FROM json_each(");
                out.absorb(value.clone());
                out.push(") WHERE json_each.value IN (");
                bind_text_list(&mut out, args);
                out.push("))");
            } else {
                out.absorb(value.clone());
                out.push(" IN (");
                bind_text_list(&mut out, args);
                out.push(")");
            }
        }
    }
    Ok(out)
}

fn bind_text_list(out: &mut SqlFragment, values: &[String]) {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(", ");
        }
        out.bind(SqlValue::Text(v.clone()));
    }
}

fn typed_param(value: &TypedValue) -> SqlValue {
    match value {
        TypedValue::Text(s) => SqlValue::Text(s.clone()),
        TypedValue::Number(n) => SqlValue::Real(*n),
        TypedValue::Date(d) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
        TypedValue::Bool(b) => SqlValue::Integer(*b as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use targeting_core::ast::{CompiledFilter, MemberBlock};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Params must appear in the same order as their placeholders.
    #[test]
    fn range_filter_binds_params_in_order() {
        let filter = CompiledFilter {
            binding: FieldBinding::HouseholdCore {
                field: "size".to_string(),
                multi_valued: false,
            },
            comparison: CompiledComparison::Range(TypedValue::Number(2.0), TypedValue::Number(5.0)),
        };
        let frag = household_filter_sql(&filter).unwrap();
        assert_eq!(frag.sql, "h.size >= ? AND h.size <= ?");
        assert_eq!(
            frag.params,
            vec![SqlValue::Real(2.0), SqlValue::Real(5.0)]
        );
    }

    #[test]
    fn age_filter_lowers_to_birth_date_bounds() {
        let filter = CompiledFilter {
            binding: FieldBinding::Age,
            comparison: CompiledComparison::AtLeast(TypedValue::Number(18.0)),
        };
        let frag = individual_filter_sql(&filter, date("2024-06-15")).unwrap();
        // At least 18 means born on or before the 18th birthday cutoff.
        assert_eq!(frag.sql, "i.birth_date <= ?");
        assert_eq!(
            frag.params,
            vec![SqlValue::Text("2006-06-15".to_string())]
        );
    }

    #[test]
    fn member_block_lowers_to_exists_over_candidates() {
        let rule = CompiledRule {
            index: 0,
            inclusion: None,
            household_filters: vec![],
            member_blocks: vec![MemberBlock {
                candidates: CandidateSet {
                    collectors_only: false,
                    head_only: true,
                },
                filters: vec![CompiledFilter {
                    binding: FieldBinding::IndividualCore {
                        field: "sex".to_string(),
                        multi_valued: false,
                    },
                    comparison: CompiledComparison::Equals(TypedValue::Text(
                        "FEMALE".to_string(),
                    )),
                }],
            }],
        };
        let frag = rule_satisfied(&rule, InclusionPolicy::BypassFilters, date("2024-01-01"))
            .unwrap();
        assert!(frag.sql.contains("EXISTS (SELECT 1 FROM individuals i"));
        assert!(frag.sql.contains("i.is_head = 1"));
        assert!(frag.sql.contains("i.sex = ?"));
        assert_eq!(frag.params, vec![SqlValue::Text("FEMALE".to_string())]);
    }

    #[test]
    fn empty_criteria_matches_nothing() {
        let criteria = CompiledCriteria {
            rules: vec![],
            inclusion_policy: InclusionPolicy::BypassFilters,
        };
        let frag = criteria_where(&criteria, date("2024-01-01")).unwrap();
        assert_eq!(frag.sql, "0");
    }
}
