//! HTTP-level tests of the default transport against a mock server.
//!
//! These exercise the full stack (client, router, serializer, and the
//! reqwest-backed transport) over real HTTP.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jsonapi_sync::{Client, Query, ResourceSchema, SyncError, TransportError};

fn client_for(server: &MockServer) -> Client {
    let client = Client::new(server.uri());
    client.register_resource(
        ResourceSchema::builder("articles")
            .attribute("title")
            .to_many("tags", "tags")
            .build(),
    );
    client.register_resource(ResourceSchema::builder("tags").attribute("name").build());
    client
}

#[tokio::test]
async fn test_find_fetches_and_deserializes_a_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"type": "articles", "id": "1", "attributes": {"title": "One"}},
                {"type": "articles", "id": "2", "attributes": {"title": "Two"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let articles = client.find_all("articles").await.unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].id(), Some("1".to_string()));
    assert_eq!(articles[1].attribute("title"), Some(json!("Two")));
}

#[tokio::test]
async fn test_single_resource_queries_hit_the_id_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "articles", "id": "7", "attributes": {"title": "Seven"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let article = client.find_one_by_id("articles", "7").await.unwrap();

    assert_eq!(article.attribute("title"), Some(json!("Seven")));
    assert!(article.is_loaded());
}

#[tokio::test]
async fn test_create_posts_a_payload_without_an_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles"))
        .and(body_partial_json(json!({
            "data": {"type": "articles", "attributes": {"title": "Fresh"}}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"type": "articles", "id": "100", "attributes": {"title": "Fresh"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let article = client.new_resource("articles").unwrap();
    article.set_attribute("title", json!("Fresh"));

    client.save(&article).await.unwrap();

    assert_eq!(article.id(), Some("100".to_string()));
}

#[tokio::test]
async fn test_update_reconciles_relationships_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "type": "articles", "id": "1",
                "attributes": {"title": "Old"},
                "relationships": {"tags": {"data": [{"type": "tags", "id": "old"}]}}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tags/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "tags", "id": "new", "attributes": {"name": "New"}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/articles/1"))
        .and(body_partial_json(json!({
            "data": {"type": "articles", "id": "1", "attributes": {"title": "Renamed"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "articles", "id": "1", "attributes": {"title": "Renamed"}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/articles/1/relationships/tags"))
        .and(body_partial_json(json!({
            "data": [{"type": "tags", "id": "new"}]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/articles/1/relationships/tags"))
        .and(body_partial_json(json!({
            "data": [{"type": "tags", "id": "old"}]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let article = client.find_one_by_id("articles", "1").await.unwrap();
    let old_tag = article.linked("tags")[0].clone();
    let new_tag = client.find_one_by_id("tags", "new").await.unwrap();

    article.set_attribute("title", json!("Renamed"));
    article.link("tags", &new_tag);
    article.unlink("tags", &old_tag);

    client.save(&article).await.unwrap();

    assert!(article.pending_added("tags").is_empty());
    assert!(article.pending_removed("tags").is_empty());
}

#[tokio::test]
async fn test_error_documents_map_to_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{"status": "422", "code": "blank", "title": "Title is blank"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.find_all("articles").await;

    let Err(SyncError::Api(error)) = result else {
        panic!("expected an API error");
    };
    assert_eq!(error.status, 422);
    assert_eq!(error.code(), Some("blank"));
}

#[tokio::test]
async fn test_delete_issues_a_delete_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "articles", "id": "7"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/articles/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let article = client.find_one_by_id("articles", "7").await.unwrap();

    client.delete(&article).await.unwrap();
}

#[tokio::test]
async fn test_unreachable_server_surfaces_a_transport_error() {
    // Bind and immediately drop a server to get a port nothing listens on
    let server = MockServer::start().await;
    let dead_uri = server.uri();
    drop(server);

    let client = Client::new(dead_uri);
    client.register_resource(ResourceSchema::builder("articles").attribute("title").build());

    let result = client.find_all("articles").await;

    assert!(matches!(
        result,
        Err(SyncError::Transport(TransportError::Network(_)))
    ));
}

#[tokio::test]
async fn test_query_parameters_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .and(wiremock::matchers::query_param("filter[state]", "published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let collection = client
        .find(&Query::new("articles").filter("state", "published"))
        .await
        .unwrap();

    assert!(collection.is_empty());
}
