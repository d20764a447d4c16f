use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use bookshelf::prelude::{GraphQLServerError, QueryResult};

/// The outcome of handling a GraphQL request, ready to be sent back.
pub struct GraphQLResponse(Result<QueryResult, GraphQLServerError>);

impl GraphQLResponse {
    pub fn new(result: Result<QueryResult, GraphQLServerError>) -> Self {
        GraphQLResponse(result)
    }
}

impl IntoResponse for GraphQLResponse {
    fn into_response(self) -> Response {
        match self.0 {
            Ok(result) => (StatusCode::OK, Json(result.to_json())).into_response(),
            Err(e) => {
                let status = match &e {
                    GraphQLServerError::ClientError(_) => StatusCode::BAD_REQUEST,
                    GraphQLServerError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
                    // Documents that do not parse are answered like any other
                    // failed operation
                    GraphQLServerError::QueryError(_) => StatusCode::OK,
                    GraphQLServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = serde_json::json!({ "errors": [e] });
                (status, Json(body)).into_response()
            }
        }
    }
}
