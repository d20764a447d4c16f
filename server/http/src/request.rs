use std::collections::HashMap;

use bookshelf::prelude::{
    q, Document, GraphQLServerError, Query, QueryError, QueryVariables, RequestContext,
};

/// Builds a query from the JSON body of a `POST` request.
pub fn parse_graphql_request(
    body: &[u8],
    context: RequestContext,
    max_query_length: usize,
) -> Result<Query, GraphQLServerError> {
    // Parse request body as JSON
    let json: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| GraphQLServerError::ClientError(format!("{}", e)))?;

    // Ensure the JSON data is an object
    let obj = json.as_object().ok_or_else(|| {
        GraphQLServerError::ClientError(String::from("Request data is not an object"))
    })?;

    // Ensure the JSON data has a "query" field
    let query_value = obj.get("query").ok_or_else(|| {
        GraphQLServerError::ClientError(String::from(
            "The \"query\" field is missing in request data",
        ))
    })?;

    // Ensure the "query" field is a string
    let query_string = query_value.as_str().ok_or_else(|| {
        GraphQLServerError::ClientError(String::from("The \"query\" field is not a string"))
    })?;

    let document = parse_document(query_string, max_query_length)?;

    // Parse the "variables" field of the JSON body, if present
    let variables = match obj.get("variables") {
        None | Some(serde_json::Value::Null) => None,
        Some(variables @ serde_json::Value::Object(_)) => Some(parse_variables(variables.clone())?),
        _ => {
            return Err(GraphQLServerError::ClientError(String::from(
                "Invalid query variables provided",
            )))
        }
    };

    let operation_name = match obj.get("operationName") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(name)) => Some(name.clone()),
        _ => {
            return Err(GraphQLServerError::ClientError(String::from(
                "The \"operationName\" field is not a string",
            )))
        }
    };

    Ok(Query::new(document, variables)
        .with_operation_name(operation_name)
        .with_context(context))
}

/// Builds a query from the URL parameters of a `GET` request. Only query
/// operations may be run this way.
pub fn parse_get_request(
    params: &HashMap<String, String>,
    context: RequestContext,
    max_query_length: usize,
) -> Result<Query, GraphQLServerError> {
    let query_string = params.get("query").ok_or_else(|| {
        GraphQLServerError::ClientError(String::from(
            "The \"query\" parameter is missing in the request",
        ))
    })?;
    let document = parse_document(query_string, max_query_length)?;

    let variables = match params.get("variables").map(String::as_str) {
        None | Some("") | Some("null") => None,
        Some(text) => {
            let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
                GraphQLServerError::ClientError(format!("Invalid query variables provided: {}", e))
            })?;
            if !value.is_object() {
                return Err(GraphQLServerError::ClientError(String::from(
                    "Invalid query variables provided",
                )));
            }
            Some(parse_variables(value)?)
        }
    };

    let operation_name = params
        .get("operationName")
        .filter(|name| !name.is_empty())
        .cloned();

    if selects_mutation(&document, operation_name.as_deref()) {
        return Err(GraphQLServerError::MethodNotAllowed(String::from(
            "Mutations can only be sent with POST requests",
        )));
    }

    Ok(Query::new(document, variables)
        .with_operation_name(operation_name)
        .with_context(context))
}

fn parse_document(text: &str, max_query_length: usize) -> Result<Document, GraphQLServerError> {
    if text.len() > max_query_length {
        return Err(GraphQLServerError::ClientError(format!(
            "Query text is {} bytes long, the maximum is {}",
            text.len(),
            max_query_length
        )));
    }
    q::parse_query::<String>(text)
        .map(|document| document.into_static())
        .map_err(|e| GraphQLServerError::from(QueryError::from(e)))
}

fn parse_variables(value: serde_json::Value) -> Result<QueryVariables, GraphQLServerError> {
    serde_json::from_value(value).map_err(|e| GraphQLServerError::ClientError(format!("{}", e)))
}

/// Whether the operation the request would run is a mutation. Requests
/// that do not pick out a single operation are left to the runner, which
/// reports them.
fn selects_mutation(document: &Document, operation_name: Option<&str>) -> bool {
    let operations: Vec<_> = document
        .definitions
        .iter()
        .filter_map(|def| match def {
            q::Definition::Operation(op) => Some(op),
            q::Definition::Fragment(_) => None,
        })
        .collect();

    let name_of = |op: &q::OperationDefinition<'static, String>| match op {
        q::OperationDefinition::Query(query) => query.name.clone(),
        q::OperationDefinition::Mutation(mutation) => mutation.name.clone(),
        q::OperationDefinition::Subscription(subscription) => subscription.name.clone(),
        q::OperationDefinition::SelectionSet(_) => None,
    };

    let operation = match (operation_name, operations.as_slice()) {
        (None, [op]) => Some(*op),
        (Some(name), ops) => ops
            .iter()
            .copied()
            .find(|op| name_of(*op).as_deref() == Some(name)),
        (None, _) => None,
    };
    matches!(operation, Some(q::OperationDefinition::Mutation(_)))
}
