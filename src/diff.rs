//! The relationship differ.
//!
//! Given a resource about to be persisted as an update, the differ walks
//! the type's declared relationship attributes (in declaration order) and
//! computes the pending mutation operations to reconcile the server's
//! relationship state with the local one:
//!
//! - a to-one relationship linked to a persisted resource yields a
//!   `Replace` operation carrying that single resource;
//! - a to-many relationship yields an `Add` operation carrying its pending
//!   additions (skipped when empty) followed by a `Remove` operation
//!   carrying its pending removals (skipped when empty).
//!
//! The differ consumes the static schema; no runtime value inspection is
//! involved.

use crate::resource::Resource;
use crate::schema::AttributeKind;

/// The kind of a relationship mutation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Add the carried resources to a to-many relationship.
    Add,
    /// Remove the carried resources from a to-many relationship.
    Remove,
    /// Replace a to-one relationship with the single carried resource.
    Replace,
}

/// One pending relationship mutation.
#[derive(Debug, Clone)]
pub struct RelationshipOperation {
    /// What to do.
    pub kind: OperationKind,
    /// The local relationship name.
    pub relationship: String,
    /// The wire name, used when addressing the relationship endpoint.
    pub serialized_name: String,
    /// The resources the operation carries. Every one has an id.
    pub resources: Vec<Resource>,
}

/// Computes the ordered list of pending relationship operations for a
/// resource about to be persisted as an update.
///
/// Operations appear in the declaration order of the type's attributes;
/// for one to-many relationship with both pending additions and removals,
/// the add operation precedes the remove operation.
///
/// # Panics
///
/// Panics when a pending to-many mutation references a resource without an
/// id. Only persisted resources can be related; syncing a relationship to
/// an unsaved resource is a programmer error, not a recoverable failure.
#[must_use]
pub fn pending_operations(resource: &Resource) -> Vec<RelationshipOperation> {
    let schema = resource.schema();
    let mut operations = Vec::new();

    for descriptor in schema.attributes() {
        match &descriptor.kind {
            AttributeKind::Plain { .. } => {}
            AttributeKind::ToOne { .. } => {
                // An unset or null to-one produces no operation; so does a
                // link to a resource the server has not assigned an id yet.
                if let Some(target) = resource.to_one(&descriptor.name) {
                    if target.id().is_some() {
                        operations.push(RelationshipOperation {
                            kind: OperationKind::Replace,
                            relationship: descriptor.name.clone(),
                            serialized_name: descriptor.serialized_name.clone(),
                            resources: vec![target],
                        });
                    }
                }
            }
            AttributeKind::ToMany { .. } => {
                let added = resource.pending_added(&descriptor.name);
                if !added.is_empty() {
                    assert_persisted(&added, &descriptor.name);
                    operations.push(RelationshipOperation {
                        kind: OperationKind::Add,
                        relationship: descriptor.name.clone(),
                        serialized_name: descriptor.serialized_name.clone(),
                        resources: added,
                    });
                }
                let removed = resource.pending_removed(&descriptor.name);
                if !removed.is_empty() {
                    assert_persisted(&removed, &descriptor.name);
                    operations.push(RelationshipOperation {
                        kind: OperationKind::Remove,
                        relationship: descriptor.name.clone(),
                        serialized_name: descriptor.serialized_name.clone(),
                        resources: removed,
                    });
                }
            }
        }
    }

    operations
}

fn assert_persisted(resources: &[Resource], relationship: &str) {
    for resource in resources {
        assert!(
            resource.id().is_some(),
            "cannot sync relationship '{relationship}': a linked '{}' resource has no id; \
             only persisted resources can be related",
            resource.type_name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ResourceSchema;
    use std::sync::Arc;

    fn article_schema() -> Arc<ResourceSchema> {
        Arc::new(
            ResourceSchema::builder("articles")
                .attribute("title")
                .to_one("author", "people")
                .to_many("tags", "tags")
                .to_many("comments", "comments")
                .build(),
        )
    }

    fn person(id: &str) -> Resource {
        Resource::placeholder(
            Arc::new(ResourceSchema::builder("people").attribute("name").build()),
            id,
        )
    }

    fn tag(id: &str) -> Resource {
        Resource::placeholder(
            Arc::new(ResourceSchema::builder("tags").attribute("name").build()),
            id,
        )
    }

    #[test]
    fn test_no_pending_mutations_yield_no_operations() {
        let article = Resource::placeholder(article_schema(), "1");

        assert!(pending_operations(&article).is_empty());
    }

    #[test]
    fn test_to_one_with_persisted_target_yields_replace() {
        let article = Resource::placeholder(article_schema(), "1");
        article.set_to_one("author", Some(person("9")));

        let ops = pending_operations(&article);

        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Replace);
        assert_eq!(ops[0].relationship, "author");
        assert_eq!(ops[0].resources.len(), 1);
        assert_eq!(ops[0].resources[0].id(), Some("9".to_string()));
    }

    #[test]
    fn test_to_one_without_id_yields_nothing() {
        let article = Resource::placeholder(article_schema(), "1");
        let unsaved = Resource::new(Arc::new(
            ResourceSchema::builder("people").attribute("name").build(),
        ));
        article.set_to_one("author", Some(unsaved));

        assert!(pending_operations(&article).is_empty());
    }

    #[test]
    fn test_to_many_add_precedes_remove_for_same_relationship() {
        let article = Resource::placeholder(article_schema(), "1");
        let synced = tag("old");
        article.load_to_many("tags", vec![synced.clone()]);

        article.link("tags", &tag("new-1"));
        article.link("tags", &tag("new-2"));
        article.unlink("tags", &synced);

        let ops = pending_operations(&article);

        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind, OperationKind::Add);
        assert_eq!(ops[0].resources.len(), 2);
        assert_eq!(ops[1].kind, OperationKind::Remove);
        assert_eq!(ops[1].resources.len(), 1);
    }

    #[test]
    fn test_operations_follow_declaration_order() {
        let article = Resource::placeholder(article_schema(), "1");
        article.set_to_one("author", Some(person("9")));

        // Mutate "comments" (declared after "tags") first; declaration
        // order must still win.
        let comment_schema = Arc::new(
            ResourceSchema::builder("comments").attribute("body").build(),
        );
        article.link("comments", &Resource::placeholder(comment_schema, "c1"));
        article.link("tags", &tag("t1"));

        let ops = pending_operations(&article);
        let order: Vec<&str> = ops.iter().map(|o| o.relationship.as_str()).collect();

        assert_eq!(order, vec!["author", "tags", "comments"]);
    }

    #[test]
    fn test_empty_pending_sets_are_skipped() {
        let article = Resource::placeholder(article_schema(), "1");
        let synced = tag("a");
        article.load_to_many("tags", vec![synced.clone()]);
        article.unlink("tags", &synced);

        let ops = pending_operations(&article);

        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Remove);
    }

    #[test]
    #[should_panic(expected = "only persisted resources can be related")]
    fn test_unsaved_to_many_member_is_a_fatal_precondition() {
        let article = Resource::placeholder(article_schema(), "1");
        let unsaved = Resource::new(Arc::new(
            ResourceSchema::builder("tags").attribute("name").build(),
        ));
        article.link("tags", &unsaved);

        let _ = pending_operations(&article);
    }
}
