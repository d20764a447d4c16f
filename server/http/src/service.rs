use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query as UrlQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use bookshelf::prelude::*;

use crate::request::{parse_get_request, parse_graphql_request};
use crate::response::GraphQLResponse;

/// Serves GraphQL over `POST /graphql` and `GET /graphql`; a `GET` without
/// a query shows the GraphiQL console.
pub struct GraphQLService<Q> {
    logger: Logger,
    graphql_runner: Arc<Q>,
    max_query_length: usize,
}

impl<Q> GraphQLService<Q>
where
    Q: GraphQlRunner,
{
    /// Creates a new GraphQL service.
    pub fn new(logger: Logger, graphql_runner: Arc<Q>, max_query_length: usize) -> Self {
        GraphQLService {
            logger,
            graphql_runner,
            max_query_length,
        }
    }

    async fn run(&self, query: Result<Query, GraphQLServerError>) -> GraphQLResponse {
        let query = match query {
            Ok(query) => query,
            Err(e) => {
                debug!(self.logger, "Rejected GraphQL request"; "error" => e.to_string());
                return GraphQLResponse::new(Err(e));
            }
        };
        let result = self.graphql_runner.clone().run_query(query).await;
        GraphQLResponse::new(Ok(result))
    }
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    RequestContext::new(headers.iter().filter_map(|(name, value)| {
        value
            .to_str()
            .ok()
            .map(|value| (name.as_str(), value.to_owned()))
    }))
}

/// Handles GraphQL queries received via `POST /graphql`.
pub async fn handle_graphql_query<Q: GraphQlRunner>(
    State(service): State<Arc<GraphQLService<Q>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let query = parse_graphql_request(
        &body,
        request_context(&headers),
        service.max_query_length,
    );
    service.run(query).await.into_response()
}

/// Handles `GET /graphql`: runs the query in the URL or serves GraphiQL.
pub async fn handle_graphql_get<Q: GraphQlRunner>(
    State(service): State<Arc<GraphQLService<Q>>>,
    headers: HeaderMap,
    UrlQuery(params): UrlQuery<HashMap<String, String>>,
) -> Response {
    if !params.contains_key("query") {
        return Html(include_str!("../assets/index.html")).into_response();
    }
    let query = parse_get_request(&params, request_context(&headers), service.max_query_length);
    service.run(query).await.into_response()
}

/// Handles 404s.
pub async fn handle_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
