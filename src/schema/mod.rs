//! Static, explicit resource schemas.
//!
//! Every resource type declares its attributes as data at registration
//! time: the local name, the serialized (wire) name, and the kind (plain
//! value, to-one reference, or to-many reference). The serializer and the
//! relationship differ consume this schema instead of inspecting values at
//! runtime, so the set of relationship attributes of a type is fixed and
//! ordered.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_sync::ResourceSchema;
//!
//! let schema = ResourceSchema::builder("articles")
//!     .attribute("title")
//!     .renamed_attribute("body_text", "body-text")
//!     .date_attribute("created_at", "created-at")
//!     .to_one("author", "people")
//!     .to_many("tags", "tags")
//!     .build();
//!
//! assert_eq!(schema.type_name(), "articles");
//! assert_eq!(schema.attributes().len(), 5);
//! ```

mod registry;

pub use registry::{DateTransformer, SchemaRegistry, Transformer, TransformerRegistry};

/// The kind of a declared attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// A plain value attribute, optionally run through a named transformer
    /// on (de)serialization.
    Plain {
        /// The name of a registered [`Transformer`], if any.
        transform: Option<String>,
    },
    /// A reference to a single resource of the given type.
    ToOne {
        /// The target resource type.
        target_type: String,
    },
    /// An ordered reference to multiple resources of the given type.
    ToMany {
        /// The target resource type.
        target_type: String,
    },
}

impl AttributeKind {
    /// Returns `true` for to-one and to-many kinds.
    #[must_use]
    pub const fn is_relationship(&self) -> bool {
        matches!(self, Self::ToOne { .. } | Self::ToMany { .. })
    }
}

/// A single declared attribute of a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// The local attribute name used by application code.
    pub name: String,
    /// The name used on the wire.
    pub serialized_name: String,
    /// What kind of attribute this is.
    pub kind: AttributeKind,
}

/// The static schema of one resource type.
///
/// Immutable after construction; registered once per application lifetime
/// and shared behind an `Arc` by every instance of the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    type_name: String,
    attributes: Vec<AttributeDescriptor>,
}

impl ResourceSchema {
    /// Starts building a schema for the given type name.
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            type_name: type_name.into(),
            attributes: Vec::new(),
        }
    }

    /// The resource type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// All declared attributes, in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Looks up a declared attribute by its local name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The relationship attributes only, in declaration order.
    pub fn relationships(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.iter().filter(|a| a.kind.is_relationship())
    }
}

/// Builder for [`ResourceSchema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    type_name: String,
    attributes: Vec<AttributeDescriptor>,
}

impl SchemaBuilder {
    /// Declares a plain attribute whose wire name equals its local name.
    #[must_use]
    pub fn attribute(self, name: &str) -> Self {
        self.push(name, name, AttributeKind::Plain { transform: None })
    }

    /// Declares a plain attribute with a distinct wire name.
    #[must_use]
    pub fn renamed_attribute(self, name: &str, serialized_name: &str) -> Self {
        self.push(
            name,
            serialized_name,
            AttributeKind::Plain { transform: None },
        )
    }

    /// Declares a date attribute handled by the built-in date transformer.
    #[must_use]
    pub fn date_attribute(self, name: &str, serialized_name: &str) -> Self {
        self.transformed_attribute(name, serialized_name, DateTransformer::NAME)
    }

    /// Declares a plain attribute run through the named transformer.
    #[must_use]
    pub fn transformed_attribute(self, name: &str, serialized_name: &str, transform: &str) -> Self {
        self.push(
            name,
            serialized_name,
            AttributeKind::Plain {
                transform: Some(transform.to_string()),
            },
        )
    }

    /// Declares a to-one relationship to the given target type.
    #[must_use]
    pub fn to_one(self, name: &str, target_type: &str) -> Self {
        self.push(
            name,
            name,
            AttributeKind::ToOne {
                target_type: target_type.to_string(),
            },
        )
    }

    /// Declares a to-one relationship with a distinct wire name.
    #[must_use]
    pub fn renamed_to_one(self, name: &str, serialized_name: &str, target_type: &str) -> Self {
        self.push(
            name,
            serialized_name,
            AttributeKind::ToOne {
                target_type: target_type.to_string(),
            },
        )
    }

    /// Declares a to-many relationship to the given target type.
    #[must_use]
    pub fn to_many(self, name: &str, target_type: &str) -> Self {
        self.push(
            name,
            name,
            AttributeKind::ToMany {
                target_type: target_type.to_string(),
            },
        )
    }

    /// Declares a to-many relationship with a distinct wire name.
    #[must_use]
    pub fn renamed_to_many(self, name: &str, serialized_name: &str, target_type: &str) -> Self {
        self.push(
            name,
            serialized_name,
            AttributeKind::ToMany {
                target_type: target_type.to_string(),
            },
        )
    }

    /// Finishes the schema.
    #[must_use]
    pub fn build(self) -> ResourceSchema {
        ResourceSchema {
            type_name: self.type_name,
            attributes: self.attributes,
        }
    }

    fn push(mut self, name: &str, serialized_name: &str, kind: AttributeKind) -> Self {
        self.attributes.push(AttributeDescriptor {
            name: name.to_string(),
            serialized_name: serialized_name.to_string(),
            kind,
        });
        self
    }
}

// Verify schema types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceSchema>();
    assert_send_sync::<AttributeDescriptor>();
};
