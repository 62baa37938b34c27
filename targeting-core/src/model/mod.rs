//! Domain model: households, individuals, collector roles, attribute
//! values, and materialized/frozen population artifacts.

pub mod household;
pub mod population;
pub mod value;

pub use household::{CollectorRole, Household, Individual, PeriodicValue};
pub use population::{FrozenPopulation, MaterializedPopulation};
pub use value::AttributeValue;
