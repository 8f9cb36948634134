//! The URL-building capability.
//!
//! The engine consumes the router as a pluggable strategy: given the
//! configured base URL, a [`Router`] deterministically maps queries,
//! resource types, and relationships to URLs. The built-in
//! [`DefaultRouter`] follows JSON:API conventions:
//!
//! - `{base}/{type}` for a type's collection
//! - `{base}/{type}/{id}` / `{base}/{type}/{id1},{id2}` for lookups by id
//! - `{base}/{type}/{id}/relationships/{name}` for a relationship endpoint
//! - `filter[field]=`, `include=`, `sort=`, `page[number]=`, and
//!   `page[size]=` query parameters, with values percent-encoded

use crate::query::Query;
use crate::resource::Resource;

/// Maps queries and resources to URLs, deterministically for a given base
/// URL.
pub trait Router: Send + Sync {
    /// The URL fetching the resources a query describes.
    fn url_for_query(&self, base_url: &str, query: &Query) -> String;

    /// The URL of a type's collection.
    fn url_for_resource_type(&self, base_url: &str, type_name: &str) -> String;

    /// The URL of one relationship endpoint of a resource.
    ///
    /// `ids` optionally narrows the endpoint to specific linked resources;
    /// the engine addresses relationships through payloads and passes
    /// `None`.
    fn url_for_relationship(
        &self,
        base_url: &str,
        name: &str,
        resource: &Resource,
        ids: Option<&[String]>,
    ) -> String;
}

/// The built-in JSON:API-convention router.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRouter;

impl Router for DefaultRouter {
    fn url_for_resource_type(&self, base_url: &str, type_name: &str) -> String {
        format!("{}/{type_name}", base_url.trim_end_matches('/'))
    }

    fn url_for_query(&self, base_url: &str, query: &Query) -> String {
        let mut url = self.url_for_resource_type(base_url, query.resource_type());

        if let Some(ids) = query.ids() {
            url.push('/');
            url.push_str(&ids.join(","));
        }

        let mut params: Vec<String> = Vec::new();
        for filter in query.filters() {
            params.push(format!(
                "filter[{}]={}",
                filter.field,
                urlencoding::encode(&filter.value)
            ));
        }
        if !query.includes().is_empty() {
            let paths: Vec<String> = query
                .includes()
                .iter()
                .map(|p| urlencoding::encode(p).into_owned())
                .collect();
            params.push(format!("include={}", paths.join(",")));
        }
        if !query.sorts().is_empty() {
            let keys: Vec<String> = query
                .sorts()
                .iter()
                .map(|s| {
                    if s.ascending {
                        s.field.clone()
                    } else {
                        format!("-{}", s.field)
                    }
                })
                .collect();
            params.push(format!("sort={}", keys.join(",")));
        }
        if let Some(page) = query.page_request() {
            params.push(format!("page[number]={}", page.number));
            params.push(format!("page[size]={}", page.size));
        }

        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    fn url_for_relationship(
        &self,
        base_url: &str,
        name: &str,
        resource: &Resource,
        ids: Option<&[String]>,
    ) -> String {
        let mut url = format!(
            "{}/{}/{}/relationships/{name}",
            base_url.trim_end_matches('/'),
            resource.type_name(),
            resource.id().unwrap_or_default()
        );
        if let Some(ids) = ids {
            if !ids.is_empty() {
                url.push('/');
                url.push_str(&ids.join(","));
            }
        }
        url
    }
}

// Verify DefaultRouter is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultRouter>();
};
