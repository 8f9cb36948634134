//! The deserialization-scoped identity map.
//!
//! Created fresh for every deserialization pass and never persisted, so
//! stale identities cannot leak across independent fetches. Within one
//! pass, every `(type, id)` resolves to exactly one [`Resource`] instance.

use std::collections::{HashMap, VecDeque};

use crate::error::SyncError;
use crate::resource::Resource;
use crate::schema::SchemaRegistry;

/// Maps `(type, id)` to the single instance representing it during one
/// deserialization pass.
///
/// Mapping targets seeded by the caller take priority over newly-created
/// instances. Targets without an id (the create case) are queued per type
/// and consumed by the first primary record of that type.
pub(crate) struct IdentityMap {
    by_key: HashMap<(String, String), Resource>,
    unkeyed: HashMap<String, VecDeque<Resource>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            unkeyed: HashMap::new(),
        }
    }

    /// Seeds the map with caller-supplied mapping targets.
    pub fn seed(&mut self, targets: &[Resource]) {
        for target in targets {
            let (type_name, id) = target.identity();
            match id {
                Some(id) => {
                    self.by_key.entry((type_name, id)).or_insert_with(|| target.clone());
                }
                None => {
                    self.unkeyed
                        .entry(type_name)
                        .or_default()
                        .push_back(target.clone());
                }
            }
        }
    }

    /// Resolves a primary record to its instance, consuming a queued
    /// unkeyed mapping target of the same type if one is waiting.
    pub fn resolve_record(
        &mut self,
        type_name: &str,
        id: &str,
        registry: &SchemaRegistry,
    ) -> Result<Resource, SyncError> {
        if let Some(existing) = self.lookup(type_name, id) {
            return Ok(existing);
        }
        if let Some(target) = self
            .unkeyed
            .get_mut(type_name)
            .and_then(VecDeque::pop_front)
        {
            target.assign_id(id)?;
            self.by_key
                .insert((type_name.to_string(), id.to_string()), target.clone());
            return Ok(target);
        }
        self.create(type_name, id, registry)
    }

    /// Resolves a relationship linkage reference. Never consumes unkeyed
    /// mapping targets; references outside the response become unloaded
    /// placeholders.
    pub fn resolve_linkage(
        &mut self,
        type_name: &str,
        id: &str,
        registry: &SchemaRegistry,
    ) -> Result<Resource, SyncError> {
        if let Some(existing) = self.lookup(type_name, id) {
            return Ok(existing);
        }
        self.create(type_name, id, registry)
    }

    fn lookup(&self, type_name: &str, id: &str) -> Option<Resource> {
        self.by_key
            .get(&(type_name.to_string(), id.to_string()))
            .cloned()
    }

    fn create(
        &mut self,
        type_name: &str,
        id: &str,
        registry: &SchemaRegistry,
    ) -> Result<Resource, SyncError> {
        let created = registry.instantiate(type_name, Some(id))?;
        self.by_key
            .insert((type_name.to_string(), id.to_string()), created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ResourceSchema;

    fn registry() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        registry.register(ResourceSchema::builder("articles").attribute("title").build());
        registry
    }

    #[test]
    fn test_repeated_resolution_shares_one_instance() {
        let registry = registry();
        let mut map = IdentityMap::new();

        let first = map.resolve_linkage("articles", "1", &registry).unwrap();
        let second = map.resolve_linkage("articles", "1", &registry).unwrap();

        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn test_seeded_target_takes_priority() {
        let registry = registry();
        let target = registry.instantiate("articles", Some("1")).unwrap();
        let mut map = IdentityMap::new();
        map.seed(&[target.clone()]);

        let resolved = map.resolve_record("articles", "1", &registry).unwrap();

        assert!(resolved.ptr_eq(&target));
    }

    #[test]
    fn test_unkeyed_target_consumed_by_record_not_linkage() {
        let registry = registry();
        let fresh = registry.instantiate("articles", None).unwrap();
        let mut map = IdentityMap::new();
        map.seed(&[fresh.clone()]);

        // Linkage resolution must not adopt the waiting create target
        let linked = map.resolve_linkage("articles", "7", &registry).unwrap();
        assert!(!linked.ptr_eq(&fresh));

        // A primary record of the type adopts it and assigns the id
        let record = map.resolve_record("articles", "9", &registry).unwrap();
        assert!(record.ptr_eq(&fresh));
        assert_eq!(fresh.id(), Some("9".to_string()));
    }

    #[test]
    fn test_unknown_type_surfaces() {
        let registry = registry();
        let mut map = IdentityMap::new();

        assert!(matches!(
            map.resolve_linkage("widgets", "1", &registry),
            Err(SyncError::UnknownType { .. })
        ));
    }
}
