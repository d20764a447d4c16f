mod request;
mod response;
mod server;
mod service;

pub use self::server::{GraphQLServeError, GraphQLServer, GraphQLServerHandle};
