//! Seams between the engine and its collaborators.

pub mod cancellation;
pub mod evaluator;
pub mod store;

pub use cancellation::{Cancellable, CancellationToken};
pub use evaluator::{Evaluator, HouseholdMatch, MatchCursor, PopulationResult};
pub use store::PopulationAccess;
