pub use graphql_parser;

/// Utilities for working with GraphQL schemas.
pub mod schema;

/// Utilities for executing GraphQL.
mod execution;

/// Utilities for executing GraphQL queries and working with query ASTs.
pub mod query;

/// Utilities for working with GraphQL values.
mod values;

/// Resolvers that answer queries from a `BookStore`.
mod store;

/// The external interface for actually running queries
mod runner;

/// Prelude that exports the most important traits and types.
pub mod prelude {
    pub use super::execution::{ExecutionContext, OperationKind, Query, Resolver};
    pub use super::query::{execute_query, QueryExecutionOptions};
    pub use super::schema::{api_schema, APISchemaError, ApiSchema};
    pub use super::store::{MutationResolver, QueryResolver, StoreResolver};
    pub use super::values::MaybeCoercible;

    pub use super::runner::GraphQlRunner;
}
