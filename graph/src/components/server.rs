use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::data::query::QueryError;

/// Errors that can occur while processing incoming requests.
#[derive(Debug, Error)]
pub enum GraphQLServerError {
    /// The request is malformed; the client has to fix it.
    #[error("{0}")]
    ClientError(String),
    /// The operation may not be run through the HTTP method it came with.
    #[error("{0}")]
    MethodNotAllowed(String),
    #[error("{0}")]
    QueryError(#[from] QueryError),
    #[error("{0}")]
    InternalError(String),
}

impl From<&'static str> for GraphQLServerError {
    fn from(s: &'static str) -> Self {
        GraphQLServerError::InternalError(String::from(s))
    }
}

impl From<String> for GraphQLServerError {
    fn from(s: String) -> Self {
        GraphQLServerError::InternalError(s)
    }
}

impl Serialize for GraphQLServerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let GraphQLServerError::QueryError(e) = self {
            serializer.serialize_some(e)
        } else {
            let mut map = serializer.serialize_map(Some(1))?;
            let msg = format!("{}", self);
            map.serialize_entry("message", msg.as_str())?;
            map.end()
        }
    }
}
