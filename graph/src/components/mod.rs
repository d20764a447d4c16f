//! The service is structured as layers of components, each with a trait
//! defining its interface.
//!
//! A request/response interaction between C1 and C2 is made by C1 requiring
//! an `Arc<C2>` in its constructor and then calling the functions defined on
//! C2. The HTTP server holds a `GraphQlRunner`, which holds a `BookStore`.

/// Components dealing with processing GraphQL.
pub mod graphql;

/// Components dealing with storing entities.
pub mod store;

/// Components dealing with serving GraphQL over HTTP.
pub mod server;
