//! The client-side resource model.
//!
//! A [`Resource`] mirrors one server-side record: identified by
//! `(type, id)`, holding a mapping of attribute values, to-one references,
//! and to-many [`LinkedResourceCollection`]s, plus the dirty markers used
//! for partial updates.
//!
//! # Identity
//!
//! `Resource` is a cheap-clone handle: cloning shares the underlying state,
//! so every holder of a clone observes the same record. Relationships are
//! back-references, not ownership edges: a resource never owns the
//! resources it links to, and one `(type, id)` resolved within a single
//! response is always one instance (see the serializer's identity map).
//!
//! A resource is *loaded* once its attributes have been populated from at
//! least one successful fetch or save response. Relationship linkage may
//! reference resources outside the fetched response; those are represented
//! as unloaded placeholders carrying only their identity, loadable later
//! via the client's `ensure`.

mod collection;
mod linked;

pub use collection::{PaginationInfo, ResourceCollection};
pub use linked::LinkedResourceCollection;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::schema::{AttributeKind, ResourceSchema};

struct ResourceInner {
    schema: Arc<ResourceSchema>,
    id: Option<String>,
    attributes: HashMap<String, Value>,
    to_one: HashMap<String, Option<Resource>>,
    to_many: HashMap<String, LinkedResourceCollection>,
    dirty: HashSet<String>,
    loaded: bool,
}

/// A typed, identified domain object mirroring a server-side record.
///
/// See the [module documentation](self) for the identity model. All
/// mutators go through `&self`; state lives behind a lock so instances can
/// be shared across async tasks.
#[derive(Clone)]
pub struct Resource {
    inner: Arc<RwLock<ResourceInner>>,
}

impl Resource {
    /// Creates a fresh, local-only resource of the given schema.
    ///
    /// The resource has no id until a successful create assigns one, and
    /// is not loaded. Every declared to-many relationship starts as an
    /// empty collection.
    #[must_use]
    pub fn new(schema: Arc<ResourceSchema>) -> Self {
        Self::build(schema, None)
    }

    /// Creates an unloaded placeholder carrying only `(type, id)`.
    ///
    /// Placeholders stand in for resources referenced by linkage but not
    /// present in a response; `ensure` populates them in place.
    #[must_use]
    pub fn placeholder(schema: Arc<ResourceSchema>, id: impl Into<String>) -> Self {
        Self::build(schema, Some(id.into()))
    }

    fn build(schema: Arc<ResourceSchema>, id: Option<String>) -> Self {
        let to_many = schema
            .attributes()
            .iter()
            .filter(|a| matches!(a.kind, AttributeKind::ToMany { .. }))
            .map(|a| (a.name.clone(), LinkedResourceCollection::new()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(ResourceInner {
                schema,
                id,
                attributes: HashMap::new(),
                to_one: HashMap::new(),
                to_many,
                dirty: HashSet::new(),
                loaded: false,
            })),
        }
    }

    /// The resource type name.
    #[must_use]
    pub fn type_name(&self) -> String {
        self.read().schema.type_name().to_string()
    }

    /// The schema this resource was instantiated from.
    #[must_use]
    pub fn schema(&self) -> Arc<ResourceSchema> {
        Arc::clone(&self.read().schema)
    }

    /// The server-assigned id, or `None` for a not-yet-created resource.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.read().id.clone()
    }

    /// Returns `true` once attributes have been populated from a
    /// successful fetch or save response.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    /// Returns `true` when both handles share the same underlying state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns `true` when both resources carry the same `(type, id)`.
    ///
    /// Resources without an id never compare identical by identity; use
    /// [`Resource::ptr_eq`] for those.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        let (self_type, self_id) = self.identity();
        let (other_type, other_id) = other.identity();
        self_id.is_some() && self_type == other_type && self_id == other_id
    }

    /// The `(type, id)` pair in one read.
    #[must_use]
    pub fn identity(&self) -> (String, Option<String>) {
        let inner = self.read();
        (inner.schema.type_name().to_string(), inner.id.clone())
    }

    /// Reads a plain attribute value.
    ///
    /// Returns `None` for attributes that have not been populated or set.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.read().attributes.get(name).cloned()
    }

    /// Reads a date attribute as a typed timestamp.
    ///
    /// Returns `None` when the attribute is absent, null, or not a valid
    /// RFC 3339 string.
    #[must_use]
    pub fn date_attribute(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.attribute(name) {
            Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Sets a plain attribute and marks it dirty.
    ///
    /// # Panics
    ///
    /// Panics when the schema declares no plain attribute with this name;
    /// writing through an undeclared attribute is a programmer error.
    pub fn set_attribute(&self, name: &str, value: Value) {
        let mut inner = self.write();
        match inner.schema.attribute(name).map(|a| &a.kind) {
            Some(AttributeKind::Plain { .. }) => {}
            Some(_) => panic!(
                "attribute '{name}' of '{}' is a relationship; use set_to_one/link/unlink",
                inner.schema.type_name()
            ),
            None => panic!(
                "resource type '{}' declares no attribute '{name}'",
                inner.schema.type_name()
            ),
        }
        inner.attributes.insert(name.to_string(), value);
        inner.dirty.insert(name.to_string());
    }

    /// Reads a to-one relationship.
    ///
    /// Returns `None` both when the relationship is unset and when it is
    /// explicitly null.
    #[must_use]
    pub fn to_one(&self, name: &str) -> Option<Resource> {
        self.read().to_one.get(name).cloned().flatten()
    }

    /// Sets a to-one relationship and marks it dirty. Passing `None`
    /// records an explicit null.
    ///
    /// # Panics
    ///
    /// Panics when the schema declares no to-one relationship with this
    /// name.
    pub fn set_to_one(&self, name: &str, target: Option<Resource>) {
        let mut inner = self.write();
        assert!(
            matches!(
                inner.schema.attribute(name).map(|a| &a.kind),
                Some(AttributeKind::ToOne { .. })
            ),
            "resource type '{}' declares no to-one relationship '{name}'",
            inner.schema.type_name()
        );
        inner.to_one.insert(name.to_string(), target);
        inner.dirty.insert(name.to_string());
    }

    /// The currently-linked resources of a to-many relationship.
    ///
    /// # Panics
    ///
    /// Panics when the schema declares no to-many relationship with this
    /// name.
    #[must_use]
    pub fn linked(&self, name: &str) -> Vec<Resource> {
        let inner = self.read();
        inner
            .to_many
            .get(name)
            .unwrap_or_else(|| {
                panic!(
                    "resource type '{}' declares no to-many relationship '{name}'",
                    inner.schema.type_name()
                )
            })
            .resources()
            .to_vec()
    }

    /// Links a resource into a to-many relationship, recording the local
    /// addition for the next sync. Linking an already-linked resource is a
    /// no-op; re-linking a pending removal cancels the removal.
    ///
    /// # Panics
    ///
    /// Panics when the schema declares no to-many relationship with this
    /// name.
    pub fn link(&self, name: &str, target: &Resource) {
        self.with_to_many(name, |coll| coll.link(target));
    }

    /// Unlinks a resource from a to-many relationship, recording the local
    /// removal for the next sync. Unlinking a non-member is a no-op; an
    /// unlink of a never-synced addition cancels the addition instead of
    /// recording a removal.
    ///
    /// # Panics
    ///
    /// Panics when the schema declares no to-many relationship with this
    /// name.
    pub fn unlink(&self, name: &str, target: &Resource) {
        self.with_to_many(name, |coll| coll.unlink(target));
    }

    /// The resources locally added to a to-many relationship since the
    /// last successful sync of that relationship.
    ///
    /// # Panics
    ///
    /// Panics when the schema declares no to-many relationship with this
    /// name.
    #[must_use]
    pub fn pending_added(&self, name: &str) -> Vec<Resource> {
        let inner = self.read();
        inner
            .to_many
            .get(name)
            .unwrap_or_else(|| {
                panic!(
                    "resource type '{}' declares no to-many relationship '{name}'",
                    inner.schema.type_name()
                )
            })
            .added()
            .to_vec()
    }

    /// The resources locally removed from a to-many relationship since the
    /// last successful sync of that relationship.
    ///
    /// # Panics
    ///
    /// Panics when the schema declares no to-many relationship with this
    /// name.
    #[must_use]
    pub fn pending_removed(&self, name: &str) -> Vec<Resource> {
        let inner = self.read();
        inner
            .to_many
            .get(name)
            .unwrap_or_else(|| {
                panic!(
                    "resource type '{}' declares no to-many relationship '{name}'",
                    inner.schema.type_name()
                )
            })
            .removed()
            .to_vec()
    }

    /// The names of attributes modified since the last successful sync.
    #[must_use]
    pub fn dirty_attributes(&self) -> Vec<String> {
        let inner = self.read();
        let mut names: Vec<String> = inner.dirty.iter().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns `true` when the named attribute has been modified since the
    /// last successful sync.
    #[must_use]
    pub fn is_attribute_dirty(&self, name: &str) -> bool {
        self.read().dirty.contains(name)
    }

    // ------------------------------------------------------------------
    // Crate-internal mutators used by the serializer and the client.
    // ------------------------------------------------------------------

    /// Adopts a server-assigned id.
    ///
    /// Ids are immutable once assigned; a conflicting assignment is a
    /// validation failure of the containing document.
    pub(crate) fn assign_id(&self, id: &str) -> Result<(), crate::error::SyncError> {
        let mut inner = self.write();
        match &inner.id {
            Some(existing) if existing != id => Err(crate::error::SyncError::validation(format!(
                "resource '{}' already has id {existing}, response carries id {id}",
                inner.schema.type_name()
            ))),
            _ => {
                inner.id = Some(id.to_string());
                Ok(())
            }
        }
    }

    /// Stores an attribute value from a response without dirtying it.
    pub(crate) fn load_attribute(&self, name: &str, value: Value) {
        let mut inner = self.write();
        inner.attributes.insert(name.to_string(), value);
    }

    /// Stores a to-one reference from a response without dirtying it.
    pub(crate) fn load_to_one(&self, name: &str, target: Option<Resource>) {
        let mut inner = self.write();
        inner.to_one.insert(name.to_string(), target);
    }

    /// Replaces a to-many relationship's synced resources from a response,
    /// preserving pending local additions and removals.
    pub(crate) fn load_to_many(&self, name: &str, synced: Vec<Resource>) {
        let mut coll = self.take_to_many(name);
        coll.set_synced(synced);
        self.put_to_many(name, coll);
    }

    /// Marks the resource clean and loaded after a successful sync.
    pub(crate) fn mark_saved(&self) {
        let mut inner = self.write();
        inner.dirty.clear();
        inner.loaded = true;
    }

    /// Raw access to a to-one entry, distinguishing unset from explicit
    /// null. Used by the serializer.
    pub(crate) fn to_one_entry(&self, name: &str) -> Option<Option<Resource>> {
        self.read().to_one.get(name).cloned()
    }

    /// Clears every to-many relationship's pending sets. Used after a
    /// successful create, which embeds full linkage.
    pub(crate) fn clear_pending_links(&self) {
        let mut inner = self.write();
        for coll in inner.to_many.values_mut() {
            coll.clear_pending();
        }
    }

    /// Clears the pending additions of one relationship after its add
    /// operation succeeded.
    pub(crate) fn mark_added_synced(&self, name: &str) {
        let mut inner = self.write();
        if let Some(coll) = inner.to_many.get_mut(name) {
            coll.clear_added();
        }
    }

    /// Clears the pending removals of one relationship after its remove
    /// operation succeeded.
    pub(crate) fn mark_removed_synced(&self, name: &str) {
        let mut inner = self.write();
        if let Some(coll) = inner.to_many.get_mut(name) {
            coll.clear_removed();
        }
    }

    // Mutating a to-many collection compares identities of its members,
    // which takes their locks; the collection is moved out first so this
    // resource's own lock is never held across those reads (a member may
    // be this very resource).
    fn with_to_many(&self, name: &str, f: impl FnOnce(&mut LinkedResourceCollection)) {
        let mut coll = self.take_to_many(name);
        f(&mut coll);
        let mut inner = self.write();
        inner.to_many.insert(name.to_string(), coll);
        inner.dirty.insert(name.to_string());
    }

    fn take_to_many(&self, name: &str) -> LinkedResourceCollection {
        let mut inner = self.write();
        inner.to_many.remove(name).unwrap_or_else(|| {
            panic!(
                "resource type '{}' declares no to-many relationship '{name}'",
                inner.schema.type_name()
            )
        })
    }

    fn put_to_many(&self, name: &str, coll: LinkedResourceCollection) {
        let mut inner = self.write();
        inner.to_many.insert(name.to_string(), coll);
    }

    fn read(&self) -> RwLockReadGuard<'_, ResourceInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ResourceInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Prints identity only; the resource graph may contain cycles.
impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.read();
        f.debug_struct("Resource")
            .field("type", &inner.schema.type_name())
            .field("id", &inner.id)
            .field("loaded", &inner.loaded)
            .finish_non_exhaustive()
    }
}

// Verify Resource is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Resource>();
};
