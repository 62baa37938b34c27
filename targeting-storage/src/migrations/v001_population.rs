//! V001: population store — households, individuals, periodic values.

pub const MIGRATION_SQL: &str = r#"
-- Households: one row per registered household. Custom (flex) attributes
-- live in a JSON object column keyed by field name.
CREATE TABLE IF NOT EXISTS households (
    id TEXT PRIMARY KEY,
    size INTEGER NOT NULL,
    residence_status TEXT NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    registration_date TEXT NOT NULL,
    attributes TEXT NOT NULL DEFAULT '{}'
) STRICT;

CREATE INDEX IF NOT EXISTS idx_households_residence
    ON households(residence_status);

-- Individuals: household members with role flags.
-- collector_role: NONE | PRIMARY | ALTERNATE.
CREATE TABLE IF NOT EXISTS individuals (
    id TEXT PRIMARY KEY,
    household_id TEXT NOT NULL REFERENCES households(id) ON DELETE CASCADE,
    is_head INTEGER NOT NULL DEFAULT 0,
    sex TEXT NOT NULL,
    marital_status TEXT NOT NULL,
    birth_date TEXT NOT NULL,
    disability TEXT NOT NULL DEFAULT 'NOT_DISABLED',
    observed_disabilities TEXT NOT NULL DEFAULT '[]',
    collector_role TEXT NOT NULL DEFAULT 'NONE',
    attributes TEXT NOT NULL DEFAULT '{}'
) STRICT;

CREATE INDEX IF NOT EXISTS idx_individuals_household
    ON individuals(household_id);
CREATE INDEX IF NOT EXISTS idx_individuals_head
    ON individuals(household_id) WHERE is_head = 1;
CREATE INDEX IF NOT EXISTS idx_individuals_collector
    ON individuals(household_id) WHERE collector_role != 'NONE';

-- Per-round values of periodic fields. value is NULL until the round is
-- collected; an uncollected round never matches any filter. The column
-- is ANY so numbers compare numerically and text lexically.
CREATE TABLE IF NOT EXISTS periodic_values (
    individual_id TEXT NOT NULL REFERENCES individuals(id) ON DELETE CASCADE,
    field TEXT NOT NULL,
    round INTEGER NOT NULL,
    value ANY,
    collected_on TEXT,
    PRIMARY KEY (individual_id, field, round)
) STRICT;
"#;
