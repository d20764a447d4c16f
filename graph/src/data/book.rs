use serde_derive::{Deserialize, Serialize};
use std::fmt;

use crate::data::value::Value;

/// Identifier of a book. Always positive; assigned by the store and never
/// reused within one store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct BookId(i32);

impl BookId {
    pub const FIRST: BookId = BookId(1);

    /// Returns `None` unless `id` is positive.
    pub fn new(id: i32) -> Option<BookId> {
        if id > 0 {
            Some(BookId(id))
        } else {
            None
        }
    }

    pub fn as_i32(self) -> i32 {
        self.0
    }

    /// The id following this one, or `None` once the id space is used up.
    pub fn next(self) -> Option<BookId> {
        self.0.checked_add(1).map(BookId)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for BookId {
    type Error = String;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        BookId::new(id).ok_or_else(|| format!("book id must be positive, got {}", id))
    }
}

impl From<BookId> for i32 {
    fn from(id: BookId) -> i32 {
        id.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
}

impl Book {
    pub fn new(id: BookId, book: NewBook) -> Self {
        let NewBook { title, author } = book;
        Book { id, title, author }
    }

    /// Overwrites the fields present in `patch`, leaving the others alone.
    pub fn apply(&mut self, patch: BookPatch) {
        let BookPatch { title, author } = patch;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(author) = author {
            self.author = author;
        }
    }
}

impl From<Book> for Value {
    fn from(book: Book) -> Value {
        let Book { id, title, author } = book;
        Value::object(vec![
            ("id", Value::Int(id.as_i32())),
            ("title", Value::String(title)),
            ("author", Value::String(author)),
        ])
    }
}

/// The fields needed to create a book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        NewBook {
            title: title.into(),
            author: author.into(),
        }
    }
}

/// A partial update; `None` means "leave unchanged".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeDescriptor;

    #[test]
    fn ids_must_be_positive() {
        assert_eq!(BookId::new(0), None);
        assert_eq!(BookId::new(-3), None);
        assert_eq!(BookId::new(7).map(BookId::as_i32), Some(7));
        assert_eq!(BookId::new(i32::MAX).and_then(BookId::next), None);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut book = Book::new(BookId::FIRST, NewBook::new("T", "A"));
        book.apply(BookPatch {
            title: Some("X".to_owned()),
            author: None,
        });
        assert_eq!(book.title, "X");
        assert_eq!(book.author, "A");
    }

    #[test]
    fn value_uses_descriptor_field_names() {
        let book = Book::new(BookId::FIRST, NewBook::new("T", "A"));
        let value = Value::from(book);
        let descriptor = TypeDescriptor::for_kind("Book").unwrap();

        match value {
            Value::Object(object) => {
                let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
                let mut fields: Vec<_> = descriptor.fields().map(|(name, _)| name).collect();
                keys.sort();
                fields.sort();
                assert_eq!(keys, fields);
            }
            other => panic!("expected an object, got {}", other),
        }
    }

    #[test]
    fn rejects_non_positive_ids_when_deserializing() {
        let res: Result<Book, _> =
            serde_json::from_str(r#"{"id": 0, "title": "T", "author": "A"}"#);
        assert!(res.is_err());
    }
}
