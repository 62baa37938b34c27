//! Lowering of the virtual `age` field to birth-date bounds.
//!
//! Both backends lower an age comparison to a closed interval over
//! `birth_date` computed from the evaluation date, so age is always
//! "as of now", never as of rule authoring.

use chrono::{Months, NaiveDate};

use super::{CompiledComparison, TypedValue};

/// Largest age argument the compiler accepts, in whole years.
pub const MAX_AGE_YEARS: u32 = 150;

/// Closed, optional-ended bounds over `birth_date`. `None` means
/// unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
}

impl DateBounds {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min.map_or(true, |min| date >= min) && self.max.map_or(true, |max| date <= max)
    }
}

/// A person is exactly `n` years old on dates where
/// `today - (n+1) years < birth_date <= today - n years`.
///
/// Returns `None` when the comparison is not expressible over age
/// (non-numeric argument, MULTI_SELECT_MATCH); the compiler rejects those
/// shapes, so `None` here indicates a compiler bug.
pub fn birth_date_bounds(
    comparison: &CompiledComparison,
    evaluation_date: NaiveDate,
) -> Option<DateBounds> {
    match comparison {
        CompiledComparison::Equals(v) => {
            let n = as_years(v)?;
            Some(DateBounds {
                min: oldest_birth_date_for(n, evaluation_date),
                max: youngest_birth_date_for(n, evaluation_date),
            })
        }
        CompiledComparison::Range(lo, hi) => {
            let lo = as_years(lo)?;
            let hi = as_years(hi)?;
            Some(DateBounds {
                min: oldest_birth_date_for(hi, evaluation_date),
                max: youngest_birth_date_for(lo, evaluation_date),
            })
        }
        // age >= n
        CompiledComparison::AtLeast(v) => {
            let n = as_years(v)?;
            Some(DateBounds {
                min: None,
                max: youngest_birth_date_for(n, evaluation_date),
            })
        }
        // age <= n
        CompiledComparison::AtMost(v) => {
            let n = as_years(v)?;
            Some(DateBounds {
                min: oldest_birth_date_for(n, evaluation_date),
                max: None,
            })
        }
        CompiledComparison::MultiSelectMatch(_) => None,
    }
}

fn as_years(value: &TypedValue) -> Option<u32> {
    match value {
        TypedValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u32),
        _ => None,
    }
}

/// Latest birth date at which someone is at least `n` years old:
/// `evaluation_date - n years`. Ages the calendar cannot express
/// (overflow, or a date before the calendar's epoch) leave the side
/// unbounded; the compiler caps arguments at [`MAX_AGE_YEARS`] so this
/// only arises for hand-built criteria.
fn youngest_birth_date_for(n: u32, evaluation_date: NaiveDate) -> Option<NaiveDate> {
    n.checked_mul(12)
        .and_then(|months| evaluation_date.checked_sub_months(Months::new(months)))
}

/// Earliest birth date at which someone is at most `n` years old:
/// the day after `evaluation_date - (n+1) years`.
fn oldest_birth_date_for(n: u32, evaluation_date: NaiveDate) -> Option<NaiveDate> {
    n.checked_add(1)
        .and_then(|years| years.checked_mul(12))
        .and_then(|months| evaluation_date.checked_sub_months(Months::new(months)))
        .and_then(|d| d.succ_opt())
}
