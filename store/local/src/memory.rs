use parking_lot::RwLock;

use bookshelf::prelude::*;

use crate::books::Books;

/// A book store that only lives in memory.
///
/// Writers take an exclusive lock for the whole operation; readers clone
/// what they need under a shared lock, so they never observe a half-done
/// mutation.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    books: RwLock<Books>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already contains `seed`, with ids assigned in
    /// iteration order starting at 1.
    pub fn seeded(seed: impl IntoIterator<Item = NewBook>) -> Result<Self, StoreError> {
        Ok(InMemoryStore {
            books: RwLock::new(Books::seeded(seed)?),
        })
    }
}

impl BookStore for InMemoryStore {
    fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        self.books.write().create(book)
    }

    fn get(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().books.clone())
    }

    fn update(&self, id: BookId, patch: BookPatch) -> Result<Option<Book>, StoreError> {
        Ok(self.books.write().update(id, patch))
    }

    fn delete(&self, id: BookId) -> Result<bool, StoreError> {
        Ok(self.books.write().delete(id))
    }
}
