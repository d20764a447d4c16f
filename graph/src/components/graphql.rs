use async_trait::async_trait;
use std::sync::Arc;

use crate::data::query::{Query, QueryResult};

/// A component that can run GraphQL operations against a
/// [BookStore](../store/trait.BookStore.html).
#[async_trait]
pub trait GraphQlRunner: Send + Sync + 'static {
    /// Runs a GraphQL query or mutation and returns its result.
    async fn run_query(self: Arc<Self>, query: Query) -> QueryResult;
}
