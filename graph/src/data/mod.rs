/// The book entity and its input shapes.
pub mod book;

/// Data types for dealing with GraphQL queries.
pub mod query;

/// The value tree produced by resolvers.
pub mod value;
