//! Core types for the targeting criteria engine: domain model, field
//! registry, raw criteria payload, compiled AST, errors, config, and events.

pub mod ast;
pub mod config;
pub mod criteria;
pub mod errors;
pub mod events;
pub mod fields;
pub mod model;
pub mod tracing;
pub mod traits;
