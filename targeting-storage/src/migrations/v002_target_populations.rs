//! V002: target populations and frozen snapshots.

pub const MIGRATION_SQL: &str = r#"
-- Target populations. status transitions open -> frozen exactly once;
-- the compare-and-set on status is the freeze synchronization point.
CREATE TABLE IF NOT EXISTS target_populations (
    id TEXT PRIMARY KEY,
    status TEXT NOT NULL DEFAULT 'open',
    criteria_json TEXT,
    created_at INTEGER NOT NULL DEFAULT (unixepoch()),
    frozen_at INTEGER
) STRICT;

-- Snapshot rows, decoupled from the rule tree that produced them.
CREATE TABLE IF NOT EXISTS frozen_households (
    population_id TEXT NOT NULL REFERENCES target_populations(id) ON DELETE CASCADE,
    household_id TEXT NOT NULL,
    PRIMARY KEY (population_id, household_id)
) STRICT;

CREATE TABLE IF NOT EXISTS frozen_counts (
    population_id TEXT PRIMARY KEY REFERENCES target_populations(id) ON DELETE CASCADE,
    household_count INTEGER NOT NULL,
    individual_count INTEGER NOT NULL
) STRICT;
"#;
