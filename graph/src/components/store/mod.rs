mod err;

pub use err::StoreError;

use crate::data::book::{Book, BookId, BookPatch, NewBook};

/// Common trait for book stores.
///
/// Implementations must serialize mutations so that ids stay unique under
/// concurrent `create` calls, and must never expose a partially applied
/// mutation: an operation that returns an error has no effect.
pub trait BookStore: Send + Sync + 'static {
    /// Stores a new book under the next free id and returns it.
    fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Looks up a book; `Ok(None)` if there is no book with that id.
    fn get(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    /// All books in insertion order.
    fn list(&self) -> Result<Vec<Book>, StoreError>;

    /// Overwrites the fields present in `patch`. `Ok(None)` if there is no
    /// book with that id.
    fn update(&self, id: BookId, patch: BookPatch) -> Result<Option<Book>, StoreError>;

    /// Removes a book; returns whether a book was removed.
    fn delete(&self, id: BookId) -> Result<bool, StoreError>;
}
