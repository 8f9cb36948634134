//! The client façade: the orchestrator of fetch, save, and delete flows.
//!
//! A [`Client`] owns the collaborating strategies (transport, router,
//! serializer, and the schema/transformer registries) and implements the
//! public operations on top of them. Collaborators are initialized once at
//! construction and immutable thereafter, except for the base URL and the
//! trace flag, which may be reconfigured at any time and are observed by
//! subsequently issued requests only.
//!
//! # Save semantics
//!
//! Saving a resource without an id issues a single POST whose payload
//! embeds full relationship linkage. Saving a pre-existing resource issues
//! a PUT for the attributes and then reconciles relationships through a
//! strictly sequential series of dedicated requests computed by the
//! [differ](crate::diff); the series aborts on the first failure. The
//! primary update has already been applied at that point: the resource is
//! left attribute-synced but relationship-partially-synced, and the save
//! fails with the operation's error. Callers recovering from a failed save
//! should inspect the resource's pending sets to see what landed.
//!
//! # Example
//!
//! ```rust,ignore
//! use jsonapi_sync::{Client, Query, ResourceSchema};
//!
//! let client = Client::new("https://api.example.com/v1");
//! client.register_resource(
//!     ResourceSchema::builder("articles")
//!         .attribute("title")
//!         .to_many("tags", "tags")
//!         .build(),
//! );
//!
//! let articles = client.find(&Query::new("articles").include("tags")).await?;
//! let first = &articles[0];
//! first.set_attribute("title", "Renamed".into());
//! client.save(first).await?;
//! ```

mod router;
mod transport;

pub use router::{DefaultRouter, Router};
pub use transport::{HttpMethod, ReqwestTransport, Transport, TransportError, TransportResponse};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::diff::{self, OperationKind};
use crate::error::SyncError;
use crate::query::Query;
use crate::resource::{Resource, ResourceCollection};
use crate::schema::{ResourceSchema, SchemaRegistry, Transformer, TransformerRegistry};
use crate::serializer::{SerializeOptions, Serializer};

/// The orchestrator for a JSON:API service.
///
/// Generic over the [`Transport`] and [`Router`] strategies; the defaults
/// speak HTTP via reqwest and follow JSON:API URL conventions. A client is
/// `Send + Sync` (given its strategies are) and is meant to be shared:
/// every operation takes `&self`, and no state is carried across
/// operations beyond the process-wide registries and configuration.
pub struct Client<T = ReqwestTransport, R = DefaultRouter> {
    transport: T,
    router: R,
    base_url: RwLock<String>,
    trace_enabled: AtomicBool,
    schemas: Arc<SchemaRegistry>,
    transformers: Arc<TransformerRegistry>,
    serializer: Serializer,
}

impl Client {
    /// Creates a client with the built-in transport and router.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_strategies(base_url, ReqwestTransport::new(), DefaultRouter)
    }
}

impl<T: Transport, R: Router> Client<T, R> {
    /// Creates a client with custom transport and router strategies.
    #[must_use]
    pub fn with_strategies(base_url: impl Into<String>, transport: T, router: R) -> Self {
        let schemas = Arc::new(SchemaRegistry::new());
        let transformers = Arc::new(TransformerRegistry::new());
        let serializer = Serializer::new(Arc::clone(&schemas), Arc::clone(&transformers));
        Self {
            transport,
            router,
            base_url: RwLock::new(base_url.into()),
            trace_enabled: AtomicBool::new(false),
            schemas,
            transformers,
            serializer,
        }
    }

    /// The currently configured base URL.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reconfigures the base URL. Observed by subsequently issued
    /// requests; in-flight requests keep the URL they were built with.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        *self
            .base_url
            .write()
            .unwrap_or_else(PoisonError::into_inner) = base_url.into();
    }

    /// Returns `true` when request tracing is enabled.
    #[must_use]
    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled.load(Ordering::Relaxed)
    }

    /// Toggles per-request trace logging. Observed by subsequently issued
    /// requests.
    pub fn set_trace_enabled(&self, enabled: bool) {
        self.trace_enabled.store(enabled, Ordering::Relaxed);
    }

    /// The transport strategy.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Registers a resource type's schema.
    ///
    /// Register every type during initialization: registration racing an
    /// in-flight request is not synchronized beyond lock safety, and a
    /// fetch referencing an unregistered type fails with
    /// [`SyncError::UnknownType`].
    pub fn register_resource(&self, schema: ResourceSchema) {
        self.schemas.register(schema);
    }

    /// Registers an attribute-value transformer.
    pub fn register_transformer(&self, transformer: Arc<dyn Transformer>) {
        self.transformers.register(transformer);
    }

    /// Creates a fresh, local-only resource of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownType`] when the type has no registered
    /// schema.
    pub fn new_resource(&self, type_name: &str) -> Result<Resource, SyncError> {
        self.schemas.instantiate(type_name, None)
    }

    /// Fetches the resources a query describes.
    ///
    /// # Errors
    ///
    /// Fails with the unified [`SyncError`] on transport or
    /// deserialization failure.
    pub async fn find(&self, query: &Query) -> Result<ResourceCollection, SyncError> {
        let url = self.router.url_for_query(&self.base_url(), query);
        let body = self.perform(HttpMethod::Get, &url, None).await?;
        let document = self.serializer.deserialize_response(&body, &[])?;
        Ok(ResourceCollection::new(
            document.resources,
            document.pagination,
        ))
    }

    /// Fetches every resource of a type.
    ///
    /// # Errors
    ///
    /// Fails with the unified [`SyncError`] on transport or
    /// deserialization failure.
    pub async fn find_all(&self, type_name: &str) -> Result<ResourceCollection, SyncError> {
        self.find(&Query::new(type_name)).await
    }

    /// Fetches a single resource.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] when the query yields no resources;
    /// [`SyncError::TypeMismatch`] when the first resource is not of the
    /// requested type; otherwise as [`Client::find`].
    pub async fn find_one(&self, query: &Query) -> Result<Resource, SyncError> {
        let collection = self.find(query).await?;
        let Some(first) = collection.first().cloned() else {
            return Err(SyncError::NotFound {
                type_name: query.resource_type().to_string(),
                id: query
                    .ids()
                    .and_then(|ids| ids.first().cloned())
                    .unwrap_or_else(|| "*".to_string()),
            });
        };
        if first.type_name() != query.resource_type() {
            return Err(SyncError::TypeMismatch {
                expected: query.resource_type().to_string(),
                found: first.type_name(),
            });
        }
        Ok(first)
    }

    /// Fetches a single resource by type and id.
    ///
    /// # Errors
    ///
    /// As [`Client::find_one`].
    pub async fn find_one_by_id(&self, type_name: &str, id: &str) -> Result<Resource, SyncError> {
        self.find_one(&Query::with_ids(type_name, [id])).await
    }

    /// Ensures a resource is loaded, fetching it in place when it is not.
    ///
    /// A loaded resource completes immediately without any network
    /// request. An unloaded placeholder is fetched with itself as the
    /// mapping target, so the same instance is populated and returned.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] when the resource has no id to fetch by;
    /// [`SyncError::NotFound`] when the server no longer has the resource;
    /// otherwise as [`Client::find`].
    pub async fn ensure(&self, resource: &Resource) -> Result<Resource, SyncError> {
        self.ensure_with(resource, |query| query).await
    }

    /// Like [`Client::ensure`], with a query modifier for adding includes
    /// or filters to the generated lookup.
    ///
    /// # Errors
    ///
    /// As [`Client::ensure`].
    pub async fn ensure_with<F>(&self, resource: &Resource, modify: F) -> Result<Resource, SyncError>
    where
        F: FnOnce(Query) -> Query,
    {
        if resource.is_loaded() {
            return Ok(resource.clone());
        }

        let query = modify(Query::for_resource(resource)?);
        let url = self.router.url_for_query(&self.base_url(), &query);
        let body = self.perform(HttpMethod::Get, &url, None).await?;
        let document = self
            .serializer
            .deserialize_response(&body, &[resource.clone()])?;

        if document.resources.is_empty() {
            return Err(SyncError::NotFound {
                type_name: resource.type_name(),
                id: resource.id().unwrap_or_else(|| "*".to_string()),
            });
        }
        Ok(resource.clone())
    }

    /// Persists a resource: a create for resources without an id, an
    /// update plus relationship reconciliation for pre-existing ones.
    ///
    /// On success the same instance is returned, populated from the
    /// server's response.
    ///
    /// # Errors
    ///
    /// Fails with the unified [`SyncError`]. For updates, a relationship
    /// operation failure aborts the remaining operations and surfaces as
    /// the save's failure even though the attribute update already
    /// succeeded; see the [module documentation](self) for the
    /// partial-application window.
    pub async fn save(&self, resource: &Resource) -> Result<Resource, SyncError> {
        if resource.id().is_none() {
            self.create(resource).await
        } else {
            self.update(resource).await
        }
    }

    /// Deletes a resource on the server.
    ///
    /// The local instance is left untouched; what the caller does with it
    /// afterwards is their decision.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] when the resource has no id; transport
    /// errors pass through unchanged; error statuses surface as
    /// [`SyncError::Api`].
    pub async fn delete(&self, resource: &Resource) -> Result<(), SyncError> {
        let query = Query::for_resource(resource)?;
        let url = self.router.url_for_query(&self.base_url(), &query);
        self.perform(HttpMethod::Delete, &url, None).await?;
        Ok(())
    }

    async fn create(&self, resource: &Resource) -> Result<Resource, SyncError> {
        let payload = self
            .serializer
            .serialize_resource(resource, SerializeOptions::CREATE)?;
        let url = self
            .router
            .url_for_resource_type(&self.base_url(), &resource.type_name());
        let body = self.perform(HttpMethod::Post, &url, Some(&payload)).await?;

        if body.is_empty() {
            resource.mark_saved();
        } else {
            self.serializer
                .deserialize_response(&body, &[resource.clone()])?;
        }
        // The POST embedded full linkage; nothing is pending anymore.
        resource.clear_pending_links();
        Ok(resource.clone())
    }

    async fn update(&self, resource: &Resource) -> Result<Resource, SyncError> {
        let payload = self
            .serializer
            .serialize_resource(resource, SerializeOptions::UPDATE)?;
        let query = Query::for_resource(resource)?;
        let url = self.router.url_for_query(&self.base_url(), &query);
        let body = self.perform(HttpMethod::Put, &url, Some(&payload)).await?;

        if body.is_empty() {
            resource.mark_saved();
        } else {
            self.serializer
                .deserialize_response(&body, &[resource.clone()])?;
        }

        // Reconcile relationships sequentially; operation N+1 is not
        // issued until N resolved, and the first failure aborts the rest.
        for operation in diff::pending_operations(resource) {
            let url = self.router.url_for_relationship(
                &self.base_url(),
                &operation.serialized_name,
                resource,
                None,
            );
            let method = match operation.kind {
                OperationKind::Add => HttpMethod::Post,
                OperationKind::Remove => HttpMethod::Delete,
                OperationKind::Replace => HttpMethod::Put,
            };
            let payload = Serializer::serialize_linkage(&operation);
            self.perform(method, &url, Some(&payload)).await?;

            match operation.kind {
                OperationKind::Add => resource.mark_added_synced(&operation.relationship),
                OperationKind::Remove => resource.mark_removed_synced(&operation.relationship),
                OperationKind::Replace => {}
            }
        }

        Ok(resource.clone())
    }

    async fn perform(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<Vec<u8>, SyncError> {
        if self.trace_enabled() {
            tracing::debug!(method = %method, url, "issuing request");
        }

        let response = self.transport.request(method, url, payload).await?;

        if self.trace_enabled() {
            tracing::debug!(status = response.status, url, "received response");
        }

        if response.is_success() {
            Ok(response.body)
        } else {
            tracing::warn!(status = response.status, url, "API request failed");
            Err(self
                .serializer
                .deserialize_error_payload(&response.body, response.status))
        }
    }
}

// Verify the default client is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Client>();
};
