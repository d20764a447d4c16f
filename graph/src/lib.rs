/// Traits and types for all system components.
pub mod components;

/// Common data types used throughout the bookshelf.
pub mod data;

/// Static descriptions of entity kinds.
pub mod schema;

/// Logging utilities.
pub mod log;

/// Tuning knobs read from the environment.
pub mod env;

pub use graphql_parser;
pub use serde_json;
pub use slog;
pub use tokio;

/// A prelude that makes all system component traits and data types available.
///
/// Add the following code to import all traits and data types listed below at once.
///
/// ```
/// use bookshelf::prelude::*;
/// ```
pub mod prelude {
    pub use async_trait::async_trait;
    pub use graphql_parser::{query as q, schema as s};
    pub use serde_derive::{Deserialize, Serialize};
    pub use slog::{self, crit, debug, error, info, o, trace, warn, Logger};
    pub use std::fmt::Debug;
    pub use std::sync::Arc;

    pub use crate::components::graphql::GraphQlRunner;
    pub use crate::components::server::GraphQLServerError;
    pub use crate::components::store::{BookStore, StoreError};
    pub use crate::data::book::{Book, BookId, BookPatch, NewBook};
    pub use crate::data::query::{
        Document, Query, QueryError, QueryExecutionError, QueryResult, QueryVariables,
        RequestContext,
    };
    pub use crate::data::value::{Object, Value};
    pub use crate::env::{EnvVars, ENV_VARS};
    pub use crate::log::factory::LoggerFactory;
    pub use crate::schema::{FieldDescriptor, InputMode, ScalarKind, SchemaError, TypeDescriptor};
}
