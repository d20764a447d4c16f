mod error;
mod query;
mod result;

pub use self::error::{QueryError, QueryExecutionError};
pub use self::query::{Document, Query, QueryVariables, RequestContext};
pub use self::result::QueryResult;
