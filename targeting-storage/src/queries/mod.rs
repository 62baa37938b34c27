//! Query helpers over the population schema.

pub mod households;
pub mod populations;
