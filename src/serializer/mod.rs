//! Conversion between wire documents and resource graphs.
//!
//! The serializer owns the three wire-facing concerns of the engine:
//!
//! - **Deserialization**: turning a response body into resources, resolving
//!   relationship linkage through a per-call identity map so one
//!   `(type, id)` is one instance, instantiating via the schema registry,
//!   and applying inbound value transformers. References pointing outside
//!   the response become unloaded placeholders.
//! - **Serialization**: turning a resource into a request payload under a
//!   [`SerializeOptions`] policy (create vs. update), emitting
//!   relationships as `{type, id}` linkage, never as embedded resources.
//! - **Error payloads**: parsing a server error document into the unified
//!   taxonomy.
//!
//! The registries are shared with the owning client; the identity map is
//! created fresh per call and never outlives it.

mod document;
mod identity;

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::diff::{OperationKind, RelationshipOperation};
use crate::error::{ApiError, ApiErrorObject, SyncError};
use crate::resource::{PaginationInfo, Resource};
use crate::schema::{AttributeKind, SchemaRegistry, Transformer, TransformerRegistry};

use document::{link_url, MaybeLinkage, RawDocument, RawLinkage, RawPrimaryData, RawRecord};
use identity::IdentityMap;

/// Controls which parts of a resource a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Emit the resource's id. Off for creates.
    pub include_id: bool,
    /// Emit only attributes modified since the last sync.
    pub dirty_only: bool,
    /// Emit to-one relationships as linkage.
    pub include_to_one: bool,
    /// Emit to-many relationships as linkage.
    pub include_to_many: bool,
}

impl SerializeOptions {
    /// The create policy: no id, every attribute, full relationship
    /// linkage.
    pub const CREATE: Self = Self {
        include_id: false,
        dirty_only: false,
        include_to_one: true,
        include_to_many: true,
    };

    /// The update policy: id plus dirty attributes only. Relationships are
    /// reconciled through dedicated operations, not the update payload.
    pub const UPDATE: Self = Self {
        include_id: true,
        dirty_only: true,
        include_to_one: false,
        include_to_many: false,
    };
}

/// The outcome of deserializing one response document.
#[derive(Debug)]
pub struct DeserializedDocument {
    /// The primary resources, in document order.
    pub resources: Vec<Resource>,
    /// Pagination descriptors from the document's `links`, if any.
    pub pagination: Option<PaginationInfo>,
}

/// Converts between wire JSON and typed resource object graphs.
#[derive(Debug, Clone)]
pub struct Serializer {
    schemas: Arc<SchemaRegistry>,
    transformers: Arc<TransformerRegistry>,
}

impl Serializer {
    /// Creates a serializer sharing the given registries.
    #[must_use]
    pub const fn new(schemas: Arc<SchemaRegistry>, transformers: Arc<TransformerRegistry>) -> Self {
        Self {
            schemas,
            transformers,
        }
    }

    /// Deserializes a response body into resources.
    ///
    /// `mapping_targets` are existing instances that take priority over
    /// newly-created ones: a target with an id captures the record of the
    /// same `(type, id)`; a target without an id is adopted by the first
    /// primary record of its type (the create case). Either way the target
    /// is populated in place.
    ///
    /// Records in the document's `included` member are resolved into the
    /// same identity map, so linkage to them yields loaded instances.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] when the body is not a parseable document
    /// or a record lacks its type or id; [`SyncError::UnknownType`] when a
    /// record's type has no registered schema.
    pub fn deserialize_response(
        &self,
        body: &[u8],
        mapping_targets: &[Resource],
    ) -> Result<DeserializedDocument, SyncError> {
        let document: RawDocument = serde_json::from_slice(body)
            .map_err(|e| SyncError::validation(format!("malformed document: {e}")))?;

        let primary: Vec<RawRecord> = match document.data {
            None => Vec::new(),
            Some(RawPrimaryData::One(record)) => vec![*record],
            Some(RawPrimaryData::Many(records)) => records,
        };
        let included = document.included.unwrap_or_default();

        let mut identities = IdentityMap::new();
        identities.seed(mapping_targets);

        // First resolve every record in the document to its instance, so
        // linkage between records (in either direction) lands on the same
        // instances the records populate.
        let mut primary_resources = Vec::with_capacity(primary.len());
        for record in &primary {
            let (type_name, id) = record_identity(record)?;
            primary_resources.push(identities.resolve_record(type_name, id, &self.schemas)?);
        }
        let mut included_resources = Vec::with_capacity(included.len());
        for record in &included {
            let (type_name, id) = record_identity(record)?;
            included_resources.push(identities.resolve_linkage(type_name, id, &self.schemas)?);
        }

        for (record, resource) in primary.iter().zip(&primary_resources) {
            self.populate(resource, record, &mut identities)?;
        }
        for (record, resource) in included.iter().zip(&included_resources) {
            self.populate(resource, record, &mut identities)?;
        }

        let pagination = document.links.and_then(|links| {
            let next = links.next.as_ref().and_then(link_url);
            let prev = links.prev.as_ref().and_then(link_url);
            (next.is_some() || prev.is_some()).then_some(PaginationInfo { next, prev })
        });

        Ok(DeserializedDocument {
            resources: primary_resources,
            pagination,
        })
    }

    /// Serializes a resource into a request payload under the given
    /// policy.
    ///
    /// Relationships are emitted as `{type, id}` linkage only; linked
    /// resources without an id are skipped (there is nothing to reference
    /// yet), and to-many relationships with nothing linked are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when an attribute references an
    /// unregistered transformer or a value the transformer rejects.
    pub fn serialize_resource(
        &self,
        resource: &Resource,
        options: SerializeOptions,
    ) -> Result<Value, SyncError> {
        let schema = resource.schema();
        let mut attributes = Map::new();
        let mut relationships = Map::new();

        for descriptor in schema.attributes() {
            match &descriptor.kind {
                AttributeKind::Plain { transform } => {
                    if options.dirty_only && !resource.is_attribute_dirty(&descriptor.name) {
                        continue;
                    }
                    let Some(value) = resource.attribute(&descriptor.name) else {
                        continue;
                    };
                    let value = match transform {
                        Some(name) => self.transformer(name)?.serialize(value)?,
                        None => value,
                    };
                    attributes.insert(descriptor.serialized_name.clone(), value);
                }
                AttributeKind::ToOne { .. } => {
                    if !options.include_to_one {
                        continue;
                    }
                    match resource.to_one_entry(&descriptor.name) {
                        None => {}
                        Some(None) => {
                            relationships.insert(
                                descriptor.serialized_name.clone(),
                                json!({ "data": null }),
                            );
                        }
                        Some(Some(target)) => {
                            if let Some(linkage) = linkage_of(&target) {
                                relationships.insert(
                                    descriptor.serialized_name.clone(),
                                    json!({ "data": linkage }),
                                );
                            }
                        }
                    }
                }
                AttributeKind::ToMany { .. } => {
                    if !options.include_to_many {
                        continue;
                    }
                    let linkage: Vec<Value> = resource
                        .linked(&descriptor.name)
                        .iter()
                        .filter_map(linkage_of)
                        .collect();
                    if !linkage.is_empty() {
                        relationships.insert(
                            descriptor.serialized_name.clone(),
                            json!({ "data": linkage }),
                        );
                    }
                }
            }
        }

        let mut record = Map::new();
        record.insert("type".to_string(), json!(schema.type_name()));
        if options.include_id {
            if let Some(id) = resource.id() {
                record.insert("id".to_string(), json!(id));
            }
        }
        if !attributes.is_empty() {
            record.insert("attributes".to_string(), Value::Object(attributes));
        }
        if !relationships.is_empty() {
            record.insert("relationships".to_string(), Value::Object(relationships));
        }

        Ok(json!({ "data": record }))
    }

    /// Builds the linkage payload for one relationship operation: a single
    /// linkage object for a replace, an array for add and remove.
    #[must_use]
    pub fn serialize_linkage(operation: &RelationshipOperation) -> Value {
        match operation.kind {
            OperationKind::Replace => {
                let data = operation
                    .resources
                    .first()
                    .and_then(linkage_of)
                    .unwrap_or(Value::Null);
                json!({ "data": data })
            }
            OperationKind::Add | OperationKind::Remove => {
                let data: Vec<Value> = operation.resources.iter().filter_map(linkage_of).collect();
                json!({ "data": data })
            }
        }
    }

    /// Parses a server error document into the unified taxonomy.
    ///
    /// Tolerant by design: an unparseable body yields an [`ApiError`] with
    /// the HTTP status and no error objects; the transport layer cannot
    /// know the API's error document shape, so this is the single place
    /// that interprets it.
    #[must_use]
    pub fn deserialize_error_payload(&self, body: &[u8], status: u16) -> SyncError {
        let errors = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|document| document.get("errors").and_then(Value::as_array).cloned())
            .map(|objects| objects.iter().map(parse_error_object).collect())
            .unwrap_or_default();
        SyncError::Api(ApiError { status, errors })
    }

    fn populate(
        &self,
        resource: &Resource,
        record: &RawRecord,
        identities: &mut IdentityMap,
    ) -> Result<(), SyncError> {
        let schema = resource.schema();

        for descriptor in schema.attributes() {
            match &descriptor.kind {
                AttributeKind::Plain { transform } => {
                    let Some(value) = record
                        .attributes
                        .as_ref()
                        .and_then(|attrs| attrs.get(&descriptor.serialized_name))
                    else {
                        continue;
                    };
                    let value = match transform {
                        Some(name) => self.transformer(name)?.deserialize(value.clone())?,
                        None => value.clone(),
                    };
                    resource.load_attribute(&descriptor.name, value);
                }
                AttributeKind::ToOne { .. } => {
                    let Some(relationship) = record
                        .relationships
                        .as_ref()
                        .and_then(|rels| rels.get(&descriptor.serialized_name))
                    else {
                        continue;
                    };
                    match &relationship.data {
                        MaybeLinkage::Absent => {}
                        MaybeLinkage::Null => resource.load_to_one(&descriptor.name, None),
                        MaybeLinkage::One(linkage) => {
                            let (type_name, id) = linkage_identity(linkage)?;
                            let target =
                                identities.resolve_linkage(type_name, id, &self.schemas)?;
                            resource.load_to_one(&descriptor.name, Some(target));
                        }
                        MaybeLinkage::Many(_) => {
                            return Err(SyncError::validation(format!(
                                "to-one relationship '{}' carries an array of linkage",
                                descriptor.serialized_name
                            )));
                        }
                    }
                }
                AttributeKind::ToMany { .. } => {
                    let Some(relationship) = record
                        .relationships
                        .as_ref()
                        .and_then(|rels| rels.get(&descriptor.serialized_name))
                    else {
                        continue;
                    };
                    match &relationship.data {
                        MaybeLinkage::Absent => {}
                        MaybeLinkage::Null => resource.load_to_many(&descriptor.name, Vec::new()),
                        MaybeLinkage::Many(linkages) => {
                            let mut targets = Vec::with_capacity(linkages.len());
                            for linkage in linkages {
                                let (type_name, id) = linkage_identity(linkage)?;
                                targets.push(identities.resolve_linkage(
                                    type_name,
                                    id,
                                    &self.schemas,
                                )?);
                            }
                            resource.load_to_many(&descriptor.name, targets);
                        }
                        MaybeLinkage::One(_) => {
                            return Err(SyncError::validation(format!(
                                "to-many relationship '{}' carries a single linkage object",
                                descriptor.serialized_name
                            )));
                        }
                    }
                }
            }
        }

        resource.mark_saved();
        Ok(())
    }

    fn transformer(&self, name: &str) -> Result<Arc<dyn Transformer>, SyncError> {
        self.transformers.get(name).ok_or_else(|| {
            SyncError::validation(format!(
                "schema references unregistered transformer '{name}'"
            ))
        })
    }
}

fn record_identity(record: &RawRecord) -> Result<(&str, &str), SyncError> {
    let type_name = record
        .type_name
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SyncError::validation("resource record lacks a type"))?;
    let id = record
        .id
        .as_deref()
        .filter(|i| !i.is_empty())
        .ok_or_else(|| {
            SyncError::validation(format!("'{type_name}' resource record lacks an id"))
        })?;
    Ok((type_name, id))
}

fn linkage_identity(linkage: &RawLinkage) -> Result<(&str, &str), SyncError> {
    let type_name = linkage
        .type_name
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SyncError::validation("relationship linkage lacks a type"))?;
    let id = linkage
        .id
        .as_deref()
        .filter(|i| !i.is_empty())
        .ok_or_else(|| {
            SyncError::validation(format!("'{type_name}' relationship linkage lacks an id"))
        })?;
    Ok((type_name, id))
}

fn linkage_of(resource: &Resource) -> Option<Value> {
    resource
        .id()
        .map(|id| json!({ "type": resource.type_name(), "id": id }))
}

fn parse_error_object(value: &Value) -> ApiErrorObject {
    let string_field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(ToString::to_string)
    };
    let status = value.get("status").and_then(|s| match s {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    ApiErrorObject {
        status,
        code: string_field("code"),
        title: string_field("title"),
        detail: string_field("detail"),
        source_pointer: value
            .get("source")
            .and_then(|s| s.get("pointer"))
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}

// Verify Serializer is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Serializer>();
};
