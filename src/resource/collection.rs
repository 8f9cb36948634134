//! The result of a fetch: resources plus pagination metadata.
//!
//! Modeled after a response wrapper with `Deref` to the inner sequence, so
//! a collection can be iterated and indexed like a slice. Collections are
//! transient: they are not cached, and pagination URLs are carried as
//! opaque descriptors for the caller to follow (pagination iteration
//! control is out of scope for this crate).

use std::ops::Deref;

use crate::resource::Resource;

/// Page descriptors from a response document's `links` member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    /// URL of the next page, if any.
    pub next: Option<String>,
    /// URL of the previous page, if any.
    pub prev: Option<String>,
}

/// An ordered sequence of fetched resources plus optional pagination
/// metadata.
#[derive(Debug, Clone, Default)]
pub struct ResourceCollection {
    resources: Vec<Resource>,
    pagination: Option<PaginationInfo>,
}

impl ResourceCollection {
    /// Creates a collection from resources and pagination metadata.
    #[must_use]
    pub const fn new(resources: Vec<Resource>, pagination: Option<PaginationInfo>) -> Self {
        Self {
            resources,
            pagination,
        }
    }

    /// Consumes the collection and returns the resources.
    #[must_use]
    pub fn into_inner(self) -> Vec<Resource> {
        self.resources
    }

    /// The pagination metadata, if the response carried any.
    #[must_use]
    pub const fn pagination(&self) -> Option<&PaginationInfo> {
        self.pagination.as_ref()
    }

    /// Returns `true` if the response advertised a next page.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(|p| p.next.is_some())
    }

    /// Returns `true` if the response advertised a previous page.
    #[must_use]
    pub fn has_prev_page(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(|p| p.prev.is_some())
    }

    /// The URL of the next page, if any.
    #[must_use]
    pub fn next_page_url(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(|p| p.next.as_deref())
    }

    /// The URL of the previous page, if any.
    #[must_use]
    pub fn prev_page_url(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(|p| p.prev.as_deref())
    }
}

/// Provides transparent access to the fetched resources.
impl Deref for ResourceCollection {
    type Target = [Resource];

    fn deref(&self) -> &Self::Target {
        &self.resources
    }
}

impl IntoIterator for ResourceCollection {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

// Verify ResourceCollection is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceCollection>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ResourceSchema;
    use std::sync::Arc;

    fn articles(n: usize) -> Vec<Resource> {
        let schema = Arc::new(ResourceSchema::builder("articles").attribute("title").build());
        (0..n)
            .map(|i| Resource::placeholder(Arc::clone(&schema), i.to_string()))
            .collect()
    }

    #[test]
    fn test_deref_allows_slice_access() {
        let collection = ResourceCollection::new(articles(3), None);

        assert_eq!(collection.len(), 3);
        assert!(!collection.is_empty());
        assert_eq!(collection[0].id(), Some("0".to_string()));
        assert_eq!(collection.iter().count(), 3);
    }

    #[test]
    fn test_pagination_queries() {
        let with_next = ResourceCollection::new(
            articles(1),
            Some(PaginationInfo {
                next: Some("https://api.test/articles?page[number]=2".to_string()),
                prev: None,
            }),
        );
        assert!(with_next.has_next_page());
        assert!(!with_next.has_prev_page());
        assert_eq!(
            with_next.next_page_url(),
            Some("https://api.test/articles?page[number]=2")
        );

        let bare = ResourceCollection::new(articles(1), None);
        assert!(!bare.has_next_page());
        assert!(bare.next_page_url().is_none());
    }

    #[test]
    fn test_into_iterator_yields_resources() {
        let collection = ResourceCollection::new(articles(2), None);

        let ids: Vec<Option<String>> = (&collection).into_iter().map(Resource::id).collect();
        assert_eq!(ids, vec![Some("0".to_string()), Some("1".to_string())]);

        let owned: Vec<Resource> = collection.into_iter().collect();
        assert_eq!(owned.len(), 2);
    }
}
