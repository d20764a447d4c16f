/// Derive the API schema from entity type descriptors.
pub mod api;

/// Utilities for working with GraphQL schema ASTs.
pub mod ast;

/// Translation between external and internal names.
pub mod names;

pub use self::api::{api_schema, APISchemaError, ApiSchema, MutationInput};
