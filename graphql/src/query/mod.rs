use bookshelf::prelude::*;
use std::sync::Arc;

use crate::execution::{execute_root_selection_set, ExecutionContext, Query, Resolver};

/// Utilities for working with GraphQL query ASTs.
pub mod ast;

/// Options available for query execution.
pub struct QueryExecutionOptions<R>
where
    R: Resolver,
{
    /// The logger to use during query execution.
    pub logger: Logger,

    /// The resolver to use.
    pub resolver: Arc<R>,
}

/// Executes a query that has already been validated and returns a result.
pub fn execute_query<R>(query: Arc<Query>, options: QueryExecutionOptions<R>) -> QueryResult
where
    R: Resolver,
{
    let ctx = ExecutionContext {
        logger: options.logger,
        resolver: options.resolver,
        query: query.clone(),
    };

    let result = execute_root_selection_set(&ctx);
    query.log_execution(result.errors.len());
    result
}
