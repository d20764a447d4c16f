use std::sync::Arc;

use reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use reqwest::{Client, Response, StatusCode};

use bookshelf::prelude::{o, slog, Logger, LoggerFactory, NewBook};
use bookshelf::schema::BOOK;
use bookshelf_graphql::prelude::{api_schema, GraphQlRunner};
use bookshelf_server_http::{GraphQLServer, GraphQLServerHandle};
use bookshelf_store::InMemoryStore;

/// Each test runs on its own runtime, so connections are not pooled
/// across tests.
pub fn client() -> Client {
    Client::new()
}

pub const ORIGIN: &str = "http://example.com";

/// Starts a server on a free port over a store holding `books`.
pub async fn start_server(books: Vec<NewBook>) -> (GraphQLServerHandle, String) {
    let logger = Logger::root(slog::Discard, o!());
    let schema = Arc::new(api_schema(&[&BOOK]).expect("API schema is valid"));
    let store = Arc::new(InMemoryStore::seeded(books).expect("seed fits into the store"));
    let runner = Arc::new(GraphQlRunner::new(&logger, schema, store));

    let handle = GraphQLServer::new(&LoggerFactory::new(logger), runner)
        .with_max_query_length(4096)
        .start(0)
        .await
        .expect("GraphQL server starts");
    let url = format!("http://127.0.0.1:{}/graphql", handle.local_addr().port());
    (handle, url)
}

/// Asserts that the response is a successful GraphQL response; returns its `"data"` field.
pub async fn assert_successful_response(
    response: Response,
) -> serde_json::Map<String, serde_json::Value> {
    assert_eq!(response.status(), StatusCode::OK);
    assert_expected_headers(&response);
    let json: serde_json::Value = response
        .json()
        .await
        .expect("GraphQL response is not valid JSON");

    assert!(
        json.get("errors").is_none(),
        "unexpected errors: {}",
        json["errors"]
    );
    json.as_object()
        .expect("GraphQL response must be an object")
        .get("data")
        .expect("GraphQL response must contain a \"data\" field")
        .as_object()
        .expect("GraphQL \"data\" field must be an object")
        .clone()
}

/// Asserts that the response is a failed GraphQL response; returns its `"errors"` field.
pub async fn assert_error_response(
    response: Response,
    expected_status: StatusCode,
) -> Vec<serde_json::Value> {
    assert_eq!(response.status(), expected_status);
    assert_expected_headers(&response);
    let json: serde_json::Value = response
        .json()
        .await
        .expect("GraphQL response is not valid JSON");

    json.as_object()
        .expect("GraphQL response must be an object")
        .get("errors")
        .expect("GraphQL error response must contain an \"errors\" field")
        .as_array()
        .expect("GraphQL \"errors\" field must be a vector")
        .clone()
}

#[track_caller]
pub fn assert_expected_headers(response: &Response) {
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .expect("Missing CORS Header"),
        &"*"
    );
}

pub fn message(error: &serde_json::Value) -> &str {
    error
        .as_object()
        .expect("Query error is not an object")
        .get("message")
        .expect("Error contains no message")
        .as_str()
        .expect("Error message is not a string")
}
