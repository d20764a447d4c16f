use bookshelf::prelude::{Object, QueryExecutionError, RequestContext, Value};

/// Resolves the root fields of an operation.
///
/// Field and argument names are internal (snake_case) names. Arguments
/// have already been checked against the API schema, so implementations
/// may rely on required arguments being present with the declared type.
/// Fields below the root are read from the object values returned here,
/// which must use internal field names as keys.
pub trait Resolver: Send + Sync {
    /// Resolves a field of the `Query` type.
    fn resolve_query_field(
        &self,
        field: &str,
        arguments: &Object,
        context: &RequestContext,
    ) -> Result<Value, QueryExecutionError>;

    /// Resolves a field of the `Mutation` type. Mutation fields are
    /// resolved one at a time, in the order they appear in the operation.
    fn resolve_mutation_field(
        &self,
        field: &str,
        arguments: &Object,
        context: &RequestContext,
    ) -> Result<Value, QueryExecutionError>;
}
