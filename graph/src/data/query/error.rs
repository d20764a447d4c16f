use graphql_parser::{query as q, Pos};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::schema::SchemaError;

/// Error caused while validating or executing a [Query](struct.Query.html).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum QueryExecutionError {
    #[error("The query is empty")]
    EmptyQuery,
    #[error("Operation name required")]
    OperationNameRequired,
    #[error("Operation name not found: {0}")]
    OperationNotFound(String),
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Type \"{1}\" has no field \"{2}\"")]
    UnknownField(Pos, String, String),
    #[error("Field \"{1}\" has no argument \"{2}\"")]
    UnknownArgument(Pos, String, String),
    #[error("No value provided for required argument: {1}")]
    MissingArgumentError(Pos, String),
    #[error("Invalid value provided for argument \"{1}\": {2}")]
    InvalidArgumentError(Pos, String, String),
    #[error("Variable \"${1}\" is not defined")]
    UndefinedVariable(Pos, String),
    #[error("No value provided for required variable: ${1}")]
    MissingVariableError(Pos, String),
    #[error("Invalid value provided for variable \"${1}\": {2}")]
    InvalidVariableError(Pos, String, String),
    #[error("Variable \"${1}\" has unknown type \"{2}\"")]
    InvalidVariableTypeError(Pos, String, String),
    #[error("Unknown fragment \"{1}\"")]
    UndefinedFragment(Pos, String),
    #[error("Fragment \"{1}\" is spread inside itself")]
    CyclicalFragment(Pos, String),
    #[error("Fragment on \"{1}\" can never apply to objects of type \"{2}\"")]
    InvalidFragmentType(Pos, String, String),
    #[error("Field \"{1}\" of type \"{2}\" must have a selection of subfields")]
    MissingSelectionSet(Pos, String, String),
    #[error("Field \"{1}\" must not have a selection since type \"{2}\" has no subfields")]
    UnexpectedSelectionSet(Pos, String, String),
    #[error("Query has too many nested selections, the maximum depth is {0}")]
    TooDeep(u8),
    #[error("Query selects {0} fields once fragments are expanded, the maximum is {1}")]
    TooComplex(u64, u64),
    #[error("Invalid input for \"{1}\": {2}")]
    InvalidInput(Pos, String, SchemaError),
    #[error("Null value resolved for non-null field: {1}")]
    NonNullError(Pos, String),
    #[error("Failed to resolve store query, error: {0}")]
    StoreError(String),
    #[error("panic processing query: {0}")]
    Panic(String),
}

impl QueryExecutionError {
    /// Source positions the error refers to, if any.
    pub fn locations(&self) -> Vec<Pos> {
        use QueryExecutionError::*;

        match self {
            UnknownField(pos, _, _)
            | UnknownArgument(pos, _, _)
            | MissingArgumentError(pos, _)
            | InvalidArgumentError(pos, _, _)
            | UndefinedVariable(pos, _)
            | MissingVariableError(pos, _)
            | InvalidVariableError(pos, _, _)
            | InvalidVariableTypeError(pos, _, _)
            | UndefinedFragment(pos, _)
            | CyclicalFragment(pos, _)
            | InvalidFragmentType(pos, _, _)
            | MissingSelectionSet(pos, _, _)
            | UnexpectedSelectionSet(pos, _, _)
            | InvalidInput(pos, _, _)
            | NonNullError(pos, _) => vec![*pos],
            EmptyQuery
            | OperationNameRequired
            | OperationNotFound(_)
            | NotSupported(_)
            | TooDeep(_)
            | TooComplex(_, _)
            | StoreError(_)
            | Panic(_) => vec![],
        }
    }
}

impl From<crate::components::store::StoreError> for QueryExecutionError {
    fn from(e: crate::components::store::StoreError) -> Self {
        QueryExecutionError::StoreError(e.to_string())
    }
}

impl From<QueryExecutionError> for Vec<QueryExecutionError> {
    fn from(e: QueryExecutionError) -> Self {
        vec![e]
    }
}

/// Error caused while processing a [Query](struct.Query.html) request.
#[derive(Clone, Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    ParseError(Arc<q::ParseError>),
    #[error("{0}")]
    ExecutionError(#[from] QueryExecutionError),
}

impl From<q::ParseError> for QueryError {
    fn from(e: q::ParseError) -> Self {
        QueryError::ParseError(Arc::new(e))
    }
}

/// Splits a `graphql_parser` error message into its position and the
/// human readable remainder. The parser formats errors as
/// `query parse error: Parse error at LINE:COLUMN\n<details>`.
fn split_parse_error(msg: &str) -> Option<(Pos, String)> {
    let msg = msg.trim_start_matches("query parse error:").trim();
    let (first, rest) = match msg.split_once('\n') {
        Some((first, rest)) => (first, rest.trim()),
        None => (msg, ""),
    };
    let (line, column) = first.rsplit(' ').next()?.split_once(':')?;
    let pos = Pos {
        line: line.parse().ok()?,
        column: column.parse().ok()?,
    };
    let message = if rest.is_empty() { first } else { rest };
    Some((pos, message.to_string()))
}

impl Serialize for QueryError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (msg, locations) = match self {
            // Parse errors carry their location inside the message; pull it
            // out so clients get it in the usual `locations` shape
            QueryError::ParseError(e) => match split_parse_error(&e.to_string()) {
                Some((pos, msg)) => (msg, vec![pos]),
                None => (e.to_string(), vec![]),
            },
            QueryError::ExecutionError(e) => (e.to_string(), e.locations()),
        };

        let len = if locations.is_empty() { 1 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("message", &msg)?;
        if !locations.is_empty() {
            let locations: Vec<HashMap<&str, usize>> = locations
                .iter()
                .map(|pos| {
                    let mut location = HashMap::new();
                    location.insert("line", pos.line);
                    location.insert("column", pos.column);
                    location
                })
                .collect();
            map.serialize_entry("locations", &locations)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execution_errors_carry_locations() {
        let err = QueryError::from(QueryExecutionError::UnknownField(
            Pos { line: 2, column: 5 },
            "Book".to_owned(),
            "isbn".to_owned(),
        ));

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "message": "Type \"Book\" has no field \"isbn\"",
                "locations": [{ "line": 2, "column": 5 }]
            })
        );
    }

    #[test]
    fn errors_without_position_only_have_a_message() {
        let err = QueryError::from(QueryExecutionError::StoreError("disk full".to_owned()));

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "message": "Failed to resolve store query, error: disk full" })
        );
    }

    #[test]
    fn parse_errors_expose_their_location() {
        let err = q::parse_query::<String>("{ books { id }").unwrap_err();
        let json = serde_json::to_value(QueryError::from(err)).unwrap();

        assert!(json["locations"][0]["line"].is_u64());
        assert!(json["message"].is_string());
    }
}
