use graphql_parser::Pos;
use std::sync::Arc;

use bookshelf::prelude::*;

use crate::execution::Resolver;

/// Answers the read operations on books. Stateless apart from the store it
/// reads from.
pub struct QueryResolver<S> {
    store: Arc<S>,
}

impl<S: BookStore> QueryResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        QueryResolver { store }
    }

    /// All books in creation order.
    pub fn resolve_list(&self) -> Result<Vec<Book>, StoreError> {
        self.store.list()
    }

    /// The book with the given id; `None` is a valid answer, not an error.
    pub fn resolve_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        self.store.get(id)
    }
}

/// Performs the changes clients ask for. Every method is a single store
/// call, so each mutation either happens completely or not at all.
pub struct MutationResolver<S> {
    logger: Logger,
    store: Arc<S>,
}

impl<S: BookStore> MutationResolver<S> {
    pub fn new(logger: &Logger, store: Arc<S>) -> Self {
        MutationResolver {
            logger: logger.new(o!("component" => "MutationResolver")),
            store,
        }
    }

    pub fn create(&self, title: String, author: String) -> Result<Book, StoreError> {
        let book = self.store.create(NewBook { title, author })?;
        debug!(self.logger, "Created book"; "id" => book.id.as_i32());
        Ok(book)
    }

    /// Overwrites the given fields. Returns `None` if there is no such book;
    /// never makes one up.
    pub fn update(
        &self,
        id: BookId,
        title: Option<String>,
        author: Option<String>,
    ) -> Result<Option<Book>, StoreError> {
        let book = self.store.update(id, BookPatch { title, author })?;
        debug!(self.logger, "Updated book"; "id" => id.as_i32(), "found" => book.is_some());
        Ok(book)
    }

    /// Returns `false` for unknown or already deleted books.
    pub fn delete(&self, id: BookId) -> Result<bool, StoreError> {
        let deleted = self.store.delete(id)?;
        debug!(self.logger, "Deleted book"; "id" => id.as_i32(), "found" => deleted);
        Ok(deleted)
    }
}

/// Dispatches root fields by their internal name to the query and mutation
/// resolvers for books.
pub struct StoreResolver<S> {
    logger: Logger,
    query: QueryResolver<S>,
    mutation: MutationResolver<S>,
}

impl<S: BookStore> StoreResolver<S> {
    pub fn new(logger: &Logger, store: Arc<S>) -> Self {
        let logger = logger.new(o!("component" => "StoreResolver"));
        StoreResolver {
            query: QueryResolver::new(store.clone()),
            mutation: MutationResolver::new(&logger, store),
            logger,
        }
    }
}

fn string_argument(arguments: &Object, name: &str) -> Result<Option<String>, QueryExecutionError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(QueryExecutionError::InvalidArgumentError(
            Pos::default(),
            name.to_owned(),
            format!("expected String but got {}", other),
        )),
    }
}

fn required_string_argument(arguments: &Object, name: &str) -> Result<String, QueryExecutionError> {
    string_argument(arguments, name)?
        .ok_or_else(|| QueryExecutionError::MissingArgumentError(Pos::default(), name.to_owned()))
}

/// Reads the `id` argument. Ids that are not positive can never belong to
/// a book, so they resolve to `None` like any other unknown id.
fn id_argument(arguments: &Object) -> Result<Option<BookId>, QueryExecutionError> {
    match arguments.get("id") {
        Some(Value::Int(id)) => Ok(BookId::new(*id)),
        Some(other) => Err(QueryExecutionError::InvalidArgumentError(
            Pos::default(),
            "id".to_owned(),
            format!("expected Int but got {}", other),
        )),
        None => Err(QueryExecutionError::MissingArgumentError(
            Pos::default(),
            "id".to_owned(),
        )),
    }
}

impl<S: BookStore> Resolver for StoreResolver<S> {
    fn resolve_query_field(
        &self,
        field: &str,
        arguments: &Object,
        _context: &RequestContext,
    ) -> Result<Value, QueryExecutionError> {
        match field {
            "books" => Ok(Value::from(self.query.resolve_list()?)),
            "book" => match id_argument(arguments)? {
                Some(id) => Ok(Value::from(self.query.resolve_by_id(id)?)),
                None => Ok(Value::Null),
            },
            _ => Err(QueryExecutionError::UnknownField(
                Pos::default(),
                "Query".to_owned(),
                field.to_owned(),
            )),
        }
    }

    fn resolve_mutation_field(
        &self,
        field: &str,
        arguments: &Object,
        context: &RequestContext,
    ) -> Result<Value, QueryExecutionError> {
        trace!(self.logger, "Mutation";
               "field" => field,
               "user_agent" => context.header("user-agent"));

        match field {
            "create_book" => {
                let title = required_string_argument(arguments, "title")?;
                let author = required_string_argument(arguments, "author")?;
                let book = self.mutation.create(title, author)?;
                Ok(Value::object(vec![("book", Value::from(book))]))
            }
            "update_book" => {
                let book = match id_argument(arguments)? {
                    Some(id) => self.mutation.update(
                        id,
                        string_argument(arguments, "title")?,
                        string_argument(arguments, "author")?,
                    )?,
                    None => None,
                };
                Ok(Value::object(vec![("book", Value::from(book))]))
            }
            "delete_book" => {
                let ok = match id_argument(arguments)? {
                    Some(id) => self.mutation.delete(id)?,
                    None => false,
                };
                Ok(Value::object(vec![("ok", Value::Boolean(ok))]))
            }
            _ => Err(QueryExecutionError::UnknownField(
                Pos::default(),
                "Mutation".to_owned(),
                field.to_owned(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf::prelude::slog::Discard;

    /// A store that holds a single book and counts calls.
    #[derive(Default)]
    struct OneBook {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl OneBook {
        fn book() -> Book {
            Book::new(BookId::FIRST, NewBook::new("T", "A"))
        }

        fn call(&self) {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl BookStore for OneBook {
        fn create(&self, book: NewBook) -> Result<Book, StoreError> {
            self.call();
            Ok(Book::new(BookId::new(2).unwrap(), book))
        }

        fn get(&self, id: BookId) -> Result<Option<Book>, StoreError> {
            self.call();
            Ok(Some(Self::book()).filter(|book| book.id == id))
        }

        fn list(&self) -> Result<Vec<Book>, StoreError> {
            self.call();
            Ok(vec![Self::book()])
        }

        fn update(&self, id: BookId, patch: BookPatch) -> Result<Option<Book>, StoreError> {
            self.call();
            Ok(Some(Self::book())
                .filter(|book| book.id == id)
                .map(|mut book| {
                    book.apply(patch);
                    book
                }))
        }

        fn delete(&self, id: BookId) -> Result<bool, StoreError> {
            self.call();
            Ok(id == BookId::FIRST)
        }
    }

    fn resolver() -> (Arc<OneBook>, StoreResolver<OneBook>) {
        let store = Arc::new(OneBook::default());
        let logger = Logger::root(Discard, o!());
        (store.clone(), StoreResolver::new(&logger, store))
    }

    fn args(pairs: Vec<(&str, Value)>) -> Object {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    #[test]
    fn dispatches_queries() {
        let (_, resolver) = resolver();
        let ctx = RequestContext::default();

        let books = resolver
            .resolve_query_field("books", &Object::new(), &ctx)
            .unwrap();
        assert_eq!(books, Value::List(vec![Value::from(OneBook::book())]));

        let missing = resolver
            .resolve_query_field("book", &args(vec![("id", Value::Int(5))]), &ctx)
            .unwrap();
        assert_eq!(missing, Value::Null);
    }

    #[test]
    fn non_positive_ids_never_reach_the_store() {
        let (store, resolver) = resolver();
        let ctx = RequestContext::default();

        let found = resolver
            .resolve_query_field("book", &args(vec![("id", Value::Int(0))]), &ctx)
            .unwrap();
        let deleted = resolver
            .resolve_mutation_field("delete_book", &args(vec![("id", Value::Int(-1))]), &ctx)
            .unwrap();

        assert_eq!(found, Value::Null);
        assert_eq!(deleted, Value::object(vec![("ok", Value::Boolean(false))]));
        assert_eq!(store.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn wraps_mutation_results_in_payloads() {
        let (_, resolver) = resolver();
        let ctx = RequestContext::default();

        let updated = resolver
            .resolve_mutation_field(
                "update_book",
                &args(vec![("id", Value::Int(1)), ("title", Value::from("X"))]),
                &ctx,
            )
            .unwrap();
        let mut expected = OneBook::book();
        expected.title = "X".to_owned();
        assert_eq!(
            updated,
            Value::object(vec![("book", Value::from(expected))])
        );

        let unknown = resolver
            .resolve_mutation_field("update_book", &args(vec![("id", Value::Int(9))]), &ctx)
            .unwrap();
        assert_eq!(unknown, Value::object(vec![("book", Value::Null)]));
    }

    #[test]
    fn unknown_fields_are_errors() {
        let (_, resolver) = resolver();
        let ctx = RequestContext::default();
        assert!(matches!(
            resolver.resolve_query_field("authors", &Object::new(), &ctx),
            Err(QueryExecutionError::UnknownField(_, _, _))
        ));
        assert!(matches!(
            resolver.resolve_mutation_field("create_book", &Object::new(), &ctx),
            Err(QueryExecutionError::MissingArgumentError(_, _))
        ));
    }
}
