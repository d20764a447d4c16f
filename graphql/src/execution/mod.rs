mod execution;
mod query;
mod resolver;

pub use self::execution::*;
pub use self::query::{coerce_variables, OperationKind, Query};
pub use self::resolver::Resolver;
