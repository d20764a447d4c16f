use serde_derive::{Deserialize, Serialize};

use bookshelf::prelude::{Book, BookId, BookPatch, NewBook, StoreError};

/// The state shared by all local stores: the books in insertion order and
/// the id the next book will get.
///
/// `next_id` is strictly greater than the id of every book, including books
/// that have since been deleted, so ids are never handed out twice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Books {
    pub next_id: BookId,
    pub books: Vec<Book>,
}

impl Default for Books {
    fn default() -> Self {
        Books {
            next_id: BookId::FIRST,
            books: Vec::new(),
        }
    }
}

impl Books {
    pub fn seeded(seed: impl IntoIterator<Item = NewBook>) -> Result<Self, StoreError> {
        let mut books = Books::default();
        for book in seed {
            books.create(book)?;
        }
        Ok(books)
    }

    /// Restores the `next_id` invariant for data loaded from outside the
    /// process. Returns an error if two books share an id.
    pub fn repair(&mut self) -> Result<bool, StoreError> {
        let mut ids: Vec<_> = self.books.iter().map(|book| book.id).collect();
        ids.sort();
        if let Some(dup) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(StoreError::Corrupt(format!(
                "more than one book with id {}",
                dup[0]
            )));
        }
        match ids.last() {
            Some(max) if *max >= self.next_id => {
                self.next_id = max.next().ok_or(StoreError::IdSpaceExhausted(*max))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn create(&mut self, book: NewBook) -> Result<Book, StoreError> {
        let id = self.next_id;
        // The last positive i32 is never assigned since there would be no
        // valid `next_id` after it
        let next_id = id.next().ok_or(StoreError::IdSpaceExhausted(id))?;
        let book = Book::new(id, book);
        self.books.push(book.clone());
        self.next_id = next_id;
        Ok(book)
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn update(&mut self, id: BookId, patch: BookPatch) -> Option<Book> {
        let book = self.books.iter_mut().find(|book| book.id == id)?;
        book.apply(patch);
        Some(book.clone())
    }

    pub fn delete(&mut self, id: BookId) -> bool {
        match self.books.iter().position(|book| book.id == id) {
            Some(pos) => {
                self.books.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(id: i32) -> BookId {
        BookId::new(id).unwrap()
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut books = Books::default();
        let first = books.create(NewBook::new("T1", "A1")).unwrap();
        assert!(books.delete(first.id));
        let second = books.create(NewBook::new("T2", "A2")).unwrap();
        assert_eq!(second.id, id(2));
    }

    #[test]
    fn repair_moves_next_id_past_existing_books() {
        let mut books = Books {
            next_id: id(1),
            books: vec![
                Book::new(id(4), NewBook::new("T", "A")),
                Book::new(id(2), NewBook::new("T", "A")),
            ],
        };
        assert_eq!(books.repair().unwrap(), true);
        assert_eq!(books.next_id, id(5));
        assert_eq!(books.repair().unwrap(), false);
    }

    #[test]
    fn repair_rejects_duplicate_ids() {
        let mut books = Books {
            next_id: id(9),
            books: vec![
                Book::new(id(3), NewBook::new("T", "A")),
                Book::new(id(3), NewBook::new("U", "B")),
            ],
        };
        assert!(matches!(books.repair(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn create_fails_when_ids_run_out() {
        let mut books = Books {
            next_id: id(i32::MAX),
            books: vec![],
        };
        assert!(matches!(
            books.create(NewBook::new("T", "A")),
            Err(StoreError::IdSpaceExhausted(_))
        ));
        assert!(books.books.is_empty());
    }
}
