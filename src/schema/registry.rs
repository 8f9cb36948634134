//! Schema and transformer registries.
//!
//! Both registries are explicit configuration objects owned by the client
//! and shared with the serializer at construction. They are read-mostly:
//! callers register all types and transformers during initialization, and
//! concurrent reads during steady-state traffic are lock-protected. No
//! ordering guarantee is given for registration racing an in-flight
//! request.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::SyncError;
use crate::resource::Resource;
use crate::schema::ResourceSchema;

/// The resource factory: maps a type name to its registered schema and
/// instantiates empty typed instances during deserialization.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<ResourceSchema>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its type name.
    ///
    /// Registering the same type name twice replaces the earlier schema;
    /// instances created from the earlier schema keep it.
    pub fn register(&self, schema: ResourceSchema) {
        let mut schemas = self
            .schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        schemas.insert(schema.type_name().to_string(), Arc::new(schema));
    }

    /// Looks up the schema registered for a type name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<Arc<ResourceSchema>> {
        self.read().get(type_name).cloned()
    }

    /// Instantiates an empty resource of the given type.
    ///
    /// With an id, the instance is an unloaded placeholder carrying only
    /// its identity; without one, it is a fresh local resource awaiting a
    /// server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownType`] when no schema is registered for
    /// the type name.
    pub fn instantiate(&self, type_name: &str, id: Option<&str>) -> Result<Resource, SyncError> {
        let schema = self.get(type_name).ok_or_else(|| SyncError::UnknownType {
            type_name: type_name.to_string(),
        })?;
        Ok(match id {
            Some(id) => Resource::placeholder(schema, id),
            None => Resource::new(schema),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ResourceSchema>>> {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Transforms a plain attribute value between its wire form and the form
/// held on the resource.
///
/// Transformers are registered by name; a schema's plain attribute refers
/// to one through `AttributeKind::Plain { transform }`.
pub trait Transformer: Send + Sync {
    /// The name schemas use to refer to this transformer.
    fn name(&self) -> &str;

    /// Converts a wire value into the value stored on the resource.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when the wire value is not valid
    /// input for this transformer.
    fn deserialize(&self, value: Value) -> Result<Value, SyncError>;

    /// Converts a stored value into its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when the stored value cannot be
    /// expressed on the wire.
    fn serialize(&self, value: Value) -> Result<Value, SyncError>;
}

/// The built-in date transformer.
///
/// Accepts RFC 3339 timestamps on the wire, normalizes them to UTC, and
/// emits RFC 3339 with seconds precision when serializing. Null passes
/// through untouched in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTransformer;

impl DateTransformer {
    /// The registered name of this transformer.
    pub const NAME: &'static str = "date";

    fn normalize(value: &Value, direction: &str) -> Result<Value, SyncError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::String(s) => {
                let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| {
                    SyncError::validation(format!("cannot {direction} date '{s}': {e}"))
                })?;
                let utc: DateTime<Utc> = parsed.with_timezone(&Utc);
                Ok(Value::String(
                    utc.to_rfc3339_opts(SecondsFormat::Secs, true),
                ))
            }
            other => Err(SyncError::validation(format!(
                "cannot {direction} date from non-string value {other}"
            ))),
        }
    }
}

impl Transformer for DateTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn deserialize(&self, value: Value) -> Result<Value, SyncError> {
        Self::normalize(&value, "deserialize")
    }

    fn serialize(&self, value: Value) -> Result<Value, SyncError> {
        Self::normalize(&value, "serialize")
    }
}

/// Registry of named [`Transformer`]s.
///
/// A new registry has the built-in [`DateTransformer`] pre-registered.
pub struct TransformerRegistry {
    transformers: RwLock<HashMap<String, Arc<dyn Transformer>>>,
}

impl TransformerRegistry {
    /// Creates a registry with the built-in transformers.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            transformers: RwLock::new(HashMap::new()),
        };
        registry.register(Arc::new(DateTransformer));
        registry
    }

    /// Registers a transformer under its own name.
    pub fn register(&self, transformer: Arc<dyn Transformer>) {
        let mut transformers = self
            .transformers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        transformers.insert(transformer.name().to_string(), transformer);
    }

    /// Looks up a transformer by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Transformer>> {
        self.transformers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .transformers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("TransformerRegistry")
            .field("transformers", &names)
            .finish()
    }
}

// Verify registries are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SchemaRegistry>();
    assert_send_sync::<TransformerRegistry>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_with_articles() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        registry.register(
            ResourceSchema::builder("articles")
                .attribute("title")
                .build(),
        );
        registry
    }

    #[test]
    fn test_instantiate_unknown_type_fails() {
        let registry = registry_with_articles();

        let result = registry.instantiate("widgets", None);
        assert!(matches!(
            result,
            Err(SyncError::UnknownType { type_name }) if type_name == "widgets"
        ));
    }

    #[test]
    fn test_instantiate_with_id_produces_unloaded_placeholder() {
        let registry = registry_with_articles();

        let placeholder = registry.instantiate("articles", Some("5")).unwrap();
        assert_eq!(placeholder.type_name(), "articles");
        assert_eq!(placeholder.id(), Some("5".to_string()));
        assert!(!placeholder.is_loaded());
    }

    #[test]
    fn test_instantiate_without_id_produces_fresh_resource() {
        let registry = registry_with_articles();

        let fresh = registry.instantiate("articles", None).unwrap();
        assert!(fresh.id().is_none());
        assert!(!fresh.is_loaded());
    }

    #[test]
    fn test_date_transformer_normalizes_offsets_to_utc() {
        let transformer = DateTransformer;

        let value = transformer
            .deserialize(json!("2024-05-01T12:30:00+02:00"))
            .unwrap();
        assert_eq!(value, json!("2024-05-01T10:30:00Z"));
    }

    #[test]
    fn test_date_transformer_round_trips() {
        let transformer = DateTransformer;

        let stored = transformer.deserialize(json!("2024-05-01T10:30:00Z")).unwrap();
        let wire = transformer.serialize(stored.clone()).unwrap();
        assert_eq!(stored, wire);
    }

    #[test]
    fn test_date_transformer_rejects_garbage() {
        let transformer = DateTransformer;

        assert!(matches!(
            transformer.deserialize(json!("yesterday")),
            Err(SyncError::Validation { .. })
        ));
        assert!(matches!(
            transformer.deserialize(json!(42)),
            Err(SyncError::Validation { .. })
        ));
    }

    #[test]
    fn test_date_transformer_passes_null_through() {
        let transformer = DateTransformer;

        assert_eq!(transformer.deserialize(Value::Null).unwrap(), Value::Null);
        assert_eq!(transformer.serialize(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_transformer_registry_has_date_built_in() {
        let registry = TransformerRegistry::new();

        assert!(registry.get(DateTransformer::NAME).is_some());
        assert!(registry.get("missing").is_none());
    }
}
