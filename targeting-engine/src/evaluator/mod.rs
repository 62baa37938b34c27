//! The reference (in-memory) evaluator backend.
//!
//! Loads the full candidate population into memory and interprets the
//! compiled AST directly. Deterministic; used for correctness tests and
//! small datasets. Its only failure mode on very large inputs is
//! exhausting memory — it never truncates silently.

pub mod matching;
pub mod memory;
pub mod reference;

pub use memory::InMemoryPopulation;
pub use reference::ReferenceEvaluator;
