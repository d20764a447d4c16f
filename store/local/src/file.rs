use anyhow::Context;
use parking_lot::RwLock;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use bookshelf::prelude::*;

use crate::books::Books;

/// A book store that keeps all books in memory and writes a snapshot to a
/// JSON file after every change.
///
/// Snapshots are written to a temporary file next to the data file and then
/// renamed over it, so the file on disk always holds either the old or the
/// new state. If writing the snapshot fails, the change is discarded and the
/// operation returns [`StoreError::Persistence`].
pub struct JsonFileStore {
    logger: Logger,
    path: PathBuf,
    books: RwLock<Books>,
}

impl JsonFileStore {
    /// Opens the store backed by `path`. A missing or blank file is treated
    /// as an empty store; the snapshot is written on the first change.
    pub fn open(logger: &Logger, path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let logger = logger.new(o!("component" => "JsonFileStore"));
        let path = path.into();

        let books = if path.exists() {
            let mut books = load(&path)?;
            if books.repair()? {
                warn!(logger, "Data file had a stale next id, repaired it";
                      "path" => path.display().to_string(),
                      "next_id" => books.next_id.as_i32());
            }
            info!(logger, "Loaded books from data file";
                  "path" => path.display().to_string(),
                  "count" => books.books.len());
            books
        } else {
            info!(logger, "Data file does not exist yet, starting empty";
                  "path" => path.display().to_string());
            Books::default()
        };

        Ok(JsonFileStore {
            logger,
            path,
            books: RwLock::new(books),
        })
    }

    /// Opens the store and adds `seed` to it if it does not contain any
    /// books yet.
    pub fn open_seeded(
        logger: &Logger,
        path: impl Into<PathBuf>,
        seed: impl IntoIterator<Item = NewBook>,
    ) -> Result<Self, StoreError> {
        let store = Self::open(logger, path)?;
        if store.books.read().books.is_empty() {
            let seeded = Books::seeded(seed)?;
            if !seeded.books.is_empty() {
                store.mutate(|books| {
                    *books = seeded;
                    Ok(())
                })?;
            }
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `f` to a copy of the current state, persists the copy, and
    /// only then makes it visible. The write lock is held throughout so
    /// mutations are serialized.
    fn mutate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Books) -> Result<T, StoreError>,
    {
        let mut books = self.books.write();
        let mut next = books.clone();
        let res = f(&mut next)?;
        if next != *books {
            save(&self.path, &next).map_err(|e| {
                error!(self.logger, "Failed to write data file";
                       "path" => self.path.display().to_string(),
                       "error" => format!("{:#}", e));
                StoreError::Persistence(e)
            })?;
            debug!(self.logger, "Wrote data file";
                   "books" => next.books.len(),
                   "next_id" => next.next_id.as_i32());
            *books = next;
        }
        Ok(res)
    }
}

fn load(path: &Path) -> Result<Books, StoreError> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(StoreError::Persistence)?;
    // Files created ahead of time with `touch` or `mktemp` hold no snapshot yet
    if text.trim().is_empty() {
        return Ok(Books::default());
    }
    serde_json::from_str(&text)
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))
}

fn save(path: &Path, books: &Books) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, books)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

impl BookStore for JsonFileStore {
    fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        self.mutate(|books| books.create(book))
    }

    fn get(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().books.clone())
    }

    fn update(&self, id: BookId, patch: BookPatch) -> Result<Option<Book>, StoreError> {
        self.mutate(|books| Ok(books.update(id, patch)))
    }

    fn delete(&self, id: BookId) -> Result<bool, StoreError> {
        self.mutate(|books| Ok(books.delete(id)))
    }
}
