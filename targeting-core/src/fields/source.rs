//! Field definition sources.

use std::sync::RwLock;

use rustc_hash::FxHashMap;

use super::core_schema;
use super::descriptor::FieldDescriptor;

/// A per-deployment source of field definitions: the core schema plus
/// dynamically administered custom and periodic fields.
///
/// The registry consults this on cache misses; implementations should be
/// cheap enough to call per unknown field.
pub trait FieldSource: Send + Sync {
    /// Look up a single field definition by name.
    fn field(&self, name: &str) -> Option<FieldDescriptor>;
}

/// An in-process field source: core schema plus administrator-defined
/// fields held in a map. `define` and `remove` model admin schema edits;
/// callers must invalidate the registry cache after using them.
pub struct StaticFieldSource {
    fields: RwLock<FxHashMap<String, FieldDescriptor>>,
}

impl StaticFieldSource {
    /// Create a source seeded with the built-in core schema.
    pub fn with_core_schema() -> Self {
        let mut fields = FxHashMap::default();
        for f in core_schema::core_fields() {
            fields.insert(f.name.clone(), f);
        }
        Self {
            fields: RwLock::new(fields),
        }
    }

    /// Create an empty source (tests that want full control).
    pub fn empty() -> Self {
        Self {
            fields: RwLock::new(FxHashMap::default()),
        }
    }

    /// Add or replace a field definition.
    pub fn define(&self, descriptor: FieldDescriptor) {
        let mut fields = self.fields.write().expect("field source lock poisoned");
        fields.insert(descriptor.name.clone(), descriptor);
    }

    /// Remove a field definition.
    pub fn remove(&self, name: &str) {
        let mut fields = self.fields.write().expect("field source lock poisoned");
        fields.remove(name);
    }
}

impl FieldSource for StaticFieldSource {
    fn field(&self, name: &str) -> Option<FieldDescriptor> {
        let fields = self.fields.read().expect("field source lock poisoned");
        fields.get(name).cloned()
    }
}
