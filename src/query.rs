//! Declarative fetch descriptions.
//!
//! A [`Query`] is an immutable description of a fetch: which resource type,
//! optionally which ids, plus filters, includes, sorting, and pagination.
//! Queries are pure data; they carry no error conditions and are consumed
//! only by the router when building URLs.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_sync::Query;
//!
//! let query = Query::new("articles")
//!     .filter("author", "42")
//!     .include("comments")
//!     .sort_desc("created-at")
//!     .page(2, 25);
//!
//! assert_eq!(query.resource_type(), "articles");
//! assert!(query.ids().is_none());
//! ```

use crate::error::SyncError;
use crate::resource::Resource;

/// A single `filter[field]=value` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// The field being filtered on.
    pub field: String,
    /// The value to match.
    pub value: String,
}

/// A sort key with direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field to sort by.
    pub field: String,
    /// `true` for ascending, `false` for descending.
    pub ascending: bool,
}

/// A page request, expressed as page number and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    pub number: u64,
    /// The number of resources per page.
    pub size: u64,
}

/// An immutable description of a fetch against a resource type.
///
/// Construct with [`Query::new`] (whole collection),
/// [`Query::with_ids`] (a specific id set), or [`Query::for_resource`]
/// (a single-resource lookup derived from an existing instance). The
/// builder methods consume and return the query by value, so a query is
/// assembled in one expression and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    resource_type: String,
    ids: Option<Vec<String>>,
    filters: Vec<Filter>,
    includes: Vec<String>,
    sorts: Vec<Sort>,
    page: Option<Page>,
}

impl Query {
    /// Creates a query for all resources of the given type.
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ids: None,
            filters: Vec::new(),
            includes: Vec::new(),
            sorts: Vec::new(),
            page: None,
        }
    }

    /// Creates a query narrowed to a specific set of ids.
    #[must_use]
    pub fn with_ids<I, S>(resource_type: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut query = Self::new(resource_type);
        query.ids = Some(ids.into_iter().map(Into::into).collect());
        query
    }

    /// Creates a single-resource lookup query for an existing resource.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when the resource has no id yet;
    /// only persisted resources can be looked up.
    pub fn for_resource(resource: &Resource) -> Result<Self, SyncError> {
        let id = resource.id().ok_or_else(|| {
            SyncError::validation(format!(
                "cannot build a lookup query for an unsaved '{}' resource",
                resource.type_name()
            ))
        })?;
        Ok(Self::with_ids(resource.type_name(), [id]))
    }

    /// Adds a `filter[field]=value` constraint.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Requests a related resource path to be included in the response.
    #[must_use]
    pub fn include(mut self, relationship: impl Into<String>) -> Self {
        self.includes.push(relationship.into());
        self
    }

    /// Adds an ascending sort key.
    #[must_use]
    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sorts.push(Sort {
            field: field.into(),
            ascending: true,
        });
        self
    }

    /// Adds a descending sort key.
    #[must_use]
    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sorts.push(Sort {
            field: field.into(),
            ascending: false,
        });
        self
    }

    /// Requests a specific page of results.
    #[must_use]
    pub const fn page(mut self, number: u64, size: u64) -> Self {
        self.page = Some(Page { number, size });
        self
    }

    /// The resource type this query targets.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// The id set this query is narrowed to, if any.
    #[must_use]
    pub fn ids(&self) -> Option<&[String]> {
        self.ids.as_deref()
    }

    /// Returns `true` when the query is narrowed to exactly one id.
    #[must_use]
    pub fn is_single_resource(&self) -> bool {
        self.ids.as_ref().is_some_and(|ids| ids.len() == 1)
    }

    /// The filter constraints, in the order they were added.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// The requested include paths, in the order they were added.
    #[must_use]
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// The sort keys, in the order they were added.
    #[must_use]
    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    /// The requested page, if any.
    #[must_use]
    pub const fn page_request(&self) -> Option<Page> {
        self.page
    }
}

// Verify Query is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Query>();
};
