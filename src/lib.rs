//! # jsonapi-sync
//!
//! A client-side resource-graph synchronization engine for JSON:API
//! services: declare a query against a resource type, receive a typed
//! collection of deserialized resources, mutate attributes and
//! relationships locally, and persist the mutations back as a minimal
//! sequence of HTTP operations.
//!
//! ## Overview
//!
//! This crate provides:
//! - Declarative queries via [`Query`] (ids, filters, includes, sorting,
//!   pagination)
//! - Static per-type schemas via [`ResourceSchema`] and a schema registry
//!   acting as the resource factory
//! - A shared-identity resource model: [`Resource`],
//!   [`LinkedResourceCollection`], [`ResourceCollection`]
//! - A serializer resolving relationship linkage through a per-response
//!   identity map, so one `(type, id)` is one instance
//! - A relationship differ computing the add/remove/replace operations
//!   needed to reconcile local relationship mutations
//! - A [`Client`] façade orchestrating fetch, save, and delete flows over
//!   pluggable [`Transport`] and [`Router`] strategies
//! - A unified error taxonomy via [`SyncError`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jsonapi_sync::{Client, Query, ResourceSchema};
//! use serde_json::json;
//!
//! // Configure the client and register schemas during initialization
//! let client = Client::new("https://api.example.com/v1");
//! client.register_resource(
//!     ResourceSchema::builder("articles")
//!         .attribute("title")
//!         .date_attribute("created_at", "created-at")
//!         .to_one("author", "people")
//!         .to_many("tags", "tags")
//!         .build(),
//! );
//! client.register_resource(ResourceSchema::builder("people").attribute("name").build());
//! client.register_resource(ResourceSchema::builder("tags").attribute("name").build());
//!
//! // Fetch a filtered collection with included relationships
//! let articles = client
//!     .find(&Query::new("articles").filter("state", "published").include("author"))
//!     .await?;
//!
//! // Mutate locally, then persist
//! let article = &articles[0];
//! article.set_attribute("title", json!("Renamed"));
//! client.save(article).await?;
//!
//! // Relationship linkage outside the response resolves to unloaded
//! // placeholders; ensure() loads them in place on demand
//! if let Some(author) = article.to_one("author") {
//!     client.ensure(&author).await?;
//!     println!("by {}", author.attribute("name").unwrap());
//! }
//! ```
//!
//! ## Save semantics
//!
//! Saving a fresh resource issues one POST whose payload embeds full
//! relationship linkage. Saving a pre-existing resource issues a PUT with
//! the dirty attributes, then reconciles relationship mutations through a
//! strictly sequential series of dedicated requests, aborting on the first
//! failure; the resource is then attribute-synced but
//! relationship-partially-synced, and its pending sets show what did not
//! land. See [`client`] for details.
//!
//! ## Design Principles
//!
//! - **No global state**: schemas and transformers live in registries
//!   owned by the client instance
//! - **Static schemas**: relationship structure is declared as data, not
//!   discovered by runtime inspection
//! - **Pluggable strategies**: transport and routing are capability traits
//!   with production defaults
//! - **Scoped identity**: the identity map lives for one deserialization
//!   pass, never longer
//! - **Async-first**: designed for use with the Tokio runtime
//! - **Thread-safe**: all shared types are `Send + Sync`

pub mod client;
pub mod diff;
pub mod error;
pub mod query;
pub mod resource;
pub mod schema;
pub mod serializer;

// Re-export public types at crate root for convenience
pub use client::{
    Client, DefaultRouter, HttpMethod, ReqwestTransport, Router, Transport, TransportError,
    TransportResponse,
};
pub use diff::{OperationKind, RelationshipOperation};
pub use error::{ApiError, ApiErrorObject, SyncError};
pub use query::{Filter, Page, Query, Sort};
pub use resource::{LinkedResourceCollection, PaginationInfo, Resource, ResourceCollection};
pub use schema::{
    AttributeDescriptor, AttributeKind, DateTransformer, ResourceSchema, SchemaBuilder,
    SchemaRegistry, Transformer, TransformerRegistry,
};
pub use serializer::{DeserializedDocument, SerializeOptions, Serializer};
