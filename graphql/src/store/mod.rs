mod resolver;

pub use self::resolver::{MutationResolver, QueryResolver, StoreResolver};
