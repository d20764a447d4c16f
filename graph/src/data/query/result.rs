use serde_derive::Serialize;

use super::error::{QueryError, QueryExecutionError};

/// The result of running a query.
///
/// `data` is absent when execution never started (the document did not
/// parse or validate); it is `null` when a non-null root field failed.
#[derive(Clone, Debug, Default, Serialize)]
pub struct QueryResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<QueryError>,
}

impl QueryResult {
    pub fn new(data: Option<serde_json::Value>) -> Self {
        QueryResult {
            data,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<QueryError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Serializes the result as the JSON response body.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "errors": [{ "message": format!("Failed to serialize result: {}", e) }] })
        })
    }
}

impl From<QueryExecutionError> for QueryResult {
    fn from(e: QueryExecutionError) -> Self {
        QueryResult::from(QueryError::from(e))
    }
}

impl From<QueryError> for QueryResult {
    fn from(e: QueryError) -> Self {
        QueryResult {
            data: None,
            errors: vec![e],
        }
    }
}

impl From<Vec<QueryExecutionError>> for QueryResult {
    fn from(e: Vec<QueryExecutionError>) -> Self {
        QueryResult {
            data: None,
            errors: e.into_iter().map(QueryError::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_and_errors_may_both_be_present() {
        let result = QueryResult::new(Some(json!({ "createBook": null }))).with_errors(vec![
            QueryError::from(QueryExecutionError::StoreError("offline".to_owned())),
        ]);

        assert_eq!(
            result.to_json(),
            json!({
                "data": { "createBook": null },
                "errors": [{ "message": "Failed to resolve store query, error: offline" }]
            })
        );
    }

    #[test]
    fn rejected_operations_have_no_data_key() {
        let result = QueryResult::from(QueryExecutionError::OperationNameRequired);
        let json = result.to_json();

        assert!(json.get("data").is_none());
        assert_eq!(json["errors"][0]["message"], "Operation name required");
    }
}
