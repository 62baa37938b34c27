//! Field registry: the per-deployment catalog of queryable fields.

pub mod core_schema;
pub mod descriptor;
pub mod registry;
pub mod source;

pub use descriptor::{FieldDescriptor, FieldScope, FieldStorage, ValueType, VirtualField};
pub use registry::FieldRegistry;
pub use source::{FieldSource, StaticFieldSource};
