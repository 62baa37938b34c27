//! FieldRegistry — cached field resolution over a deployment's source.

use std::sync::Arc;

use moka::sync::Cache;

use super::descriptor::FieldDescriptor;
use super::source::FieldSource;

const CACHE_CAPACITY: u64 = 4096;

/// Cached lookup of field definitions for one deployment context.
///
/// Pure lookup, no side effects: an unknown field resolves to `None` and
/// the caller decides whether that is a compile error. The cache must be
/// invalidated when an administrator adds or removes a custom or periodic
/// field definition.
#[derive(Clone)]
pub struct FieldRegistry {
    source: Arc<dyn FieldSource>,
    cache: Cache<String, FieldDescriptor>,
}

impl FieldRegistry {
    pub fn new(source: Arc<dyn FieldSource>) -> Self {
        Self {
            source,
            cache: Cache::new(CACHE_CAPACITY),
        }
    }

    /// Resolve a field by name. Misses consult the source; hits are served
    /// from the cache.
    pub fn resolve(&self, name: &str) -> Option<FieldDescriptor> {
        if let Some(hit) = self.cache.get(name) {
            return Some(hit);
        }
        let descriptor = self.source.field(name)?;
        self.cache.insert(name.to_string(), descriptor.clone());
        Some(descriptor)
    }

    /// Drop one field from the cache after a schema edit.
    pub fn invalidate(&self, name: &str) {
        self.cache.invalidate(name);
    }

    /// Drop the whole cache after a bulk schema change.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::super::descriptor::{FieldScope, FieldStorage, ValueType};
    use super::super::source::StaticFieldSource;
    use super::*;

    #[test]
    fn resolves_core_fields() {
        let registry = FieldRegistry::new(Arc::new(StaticFieldSource::with_core_schema()));
        let size = registry.resolve("size").unwrap();
        assert_eq!(size.value_type, ValueType::Number);
        assert!(registry.resolve("no_such_field").is_none());
    }

    #[test]
    fn newly_defined_field_visible_without_invalidation_on_first_miss() {
        let source = Arc::new(StaticFieldSource::with_core_schema());
        let registry = FieldRegistry::new(source.clone());
        assert!(registry.resolve("school_enrolled").is_none());

        source.define(FieldDescriptor::scalar(
            "school_enrolled",
            ValueType::Bool,
            FieldStorage::Custom,
            FieldScope::Individual,
        ));
        // Negative results are not cached, so the new field is visible.
        assert!(registry.resolve("school_enrolled").is_some());
    }

    #[test]
    fn invalidation_picks_up_redefined_field() {
        let source = Arc::new(StaticFieldSource::with_core_schema());
        let registry = FieldRegistry::new(source.clone());

        source.define(FieldDescriptor::scalar(
            "assistance_score",
            ValueType::Number,
            FieldStorage::Custom,
            FieldScope::Household,
        ));
        assert_eq!(
            registry.resolve("assistance_score").unwrap().value_type,
            ValueType::Number
        );

        // Admin retypes the field; stale entry stays until invalidated.
        source.define(FieldDescriptor::scalar(
            "assistance_score",
            ValueType::String,
            FieldStorage::Custom,
            FieldScope::Household,
        ));
        assert_eq!(
            registry.resolve("assistance_score").unwrap().value_type,
            ValueType::Number
        );

        registry.invalidate("assistance_score");
        assert_eq!(
            registry.resolve("assistance_score").unwrap().value_type,
            ValueType::String
        );
    }
}
