use std::sync::Arc;

use bookshelf::prelude::{
    async_trait, o, BookStore, GraphQlRunner as GraphQlRunnerTrait, Logger, Query,
    QueryExecutionError, QueryResult, ENV_VARS,
};
use bookshelf::tokio::task;

use crate::prelude::{execute_query, ApiSchema, QueryExecutionOptions, StoreResolver};

/// GraphQL runner implementation for the bookshelf.
pub struct GraphQlRunner<S> {
    logger: Logger,
    schema: Arc<ApiSchema>,
    resolver: Arc<StoreResolver<S>>,
}

impl<S> GraphQlRunner<S>
where
    S: BookStore,
{
    /// Creates a new query runner.
    pub fn new(logger: &Logger, schema: Arc<ApiSchema>, store: Arc<S>) -> Self {
        let logger = logger.new(o!("component" => "GraphQlRunner"));
        let resolver = Arc::new(StoreResolver::new(&logger, store));
        GraphQlRunner {
            logger,
            schema,
            resolver,
        }
    }

    pub fn schema(&self) -> &Arc<ApiSchema> {
        &self.schema
    }

    fn execute(
        &self,
        query: Query,
        max_depth: u8,
        max_complexity: u64,
    ) -> Result<QueryResult, QueryResult> {
        let query = crate::execution::Query::new(
            &self.logger,
            self.schema.clone(),
            query,
            max_depth,
            max_complexity,
        )?;

        Ok(execute_query(
            query,
            QueryExecutionOptions {
                logger: self.logger.clone(),
                resolver: self.resolver.clone(),
            },
        ))
    }
}

#[async_trait]
impl<S> GraphQlRunnerTrait for GraphQlRunner<S>
where
    S: BookStore,
{
    async fn run_query(self: Arc<Self>, query: Query) -> QueryResult {
        let max_depth = ENV_VARS.graphql_max_depth();
        let max_complexity = ENV_VARS.graphql_max_complexity();

        // Validation and store calls are synchronous; keep them off the
        // async workers
        task::spawn_blocking(move || {
            self.execute(query, max_depth, max_complexity)
                .unwrap_or_else(|e| e)
        })
        .await
        .unwrap_or_else(|e| QueryResult::from(QueryExecutionError::Panic(e.to_string())))
    }
}
