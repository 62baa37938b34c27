//! SQLite persistence for the targeting engine: connection management,
//! schema migrations, population queries, the push-down evaluator, and
//! the exactly-once freeze transition.

pub mod connection;
pub mod freeze;
pub mod migrations;
pub mod pushdown;
pub mod queries;

pub use connection::PopulationDb;
pub use freeze::freeze;
pub use pushdown::PushdownEvaluator;
