use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use bookshelf::prelude::*;
use bookshelf_store::{InMemoryStore, JsonFileStore};
use pretty_assertions::assert_eq;

fn id(id: i32) -> BookId {
    BookId::new(id).unwrap()
}

fn logger() -> Logger {
    Logger::root(slog::Discard, o!())
}

/// Runs `test` against every local store implementation.
fn with_stores(test: impl Fn(&dyn BookStore)) {
    test(&InMemoryStore::new());

    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(&logger(), dir.path().join("books.json")).unwrap();
    test(&store);
}

#[test]
fn ids_increase_monotonically() {
    with_stores(|store| {
        let mut last = 0;
        for i in 0..20 {
            let book = store
                .create(NewBook::new(format!("T{}", i), "A"))
                .unwrap();
            assert!(book.id.as_i32() > last);
            last = book.id.as_i32();
            if i % 3 == 0 {
                store.delete(book.id).unwrap();
            }
        }
    })
}

#[test]
fn list_returns_books_in_creation_order() {
    with_stores(|store| {
        let created: Vec<_> = (0..5)
            .map(|i| store.create(NewBook::new(format!("T{}", i), "A")).unwrap())
            .collect();
        assert_eq!(store.list().unwrap(), created);
    })
}

#[test]
fn unknown_ids_are_absent() {
    with_stores(|store| {
        assert_eq!(store.get(id(1)).unwrap(), None);
        let book = store.create(NewBook::new("T", "A")).unwrap();
        assert_eq!(store.get(id(book.id.as_i32() + 1)).unwrap(), None);
        assert_eq!(store.update(id(42), BookPatch::default()).unwrap(), None);
        assert_eq!(store.delete(id(42)).unwrap(), false);
    })
}

#[test]
fn update_keeps_omitted_fields() {
    with_stores(|store| {
        let book = store.create(NewBook::new("T", "A")).unwrap();
        let patch = BookPatch {
            title: Some("X".to_owned()),
            author: None,
        };
        let updated = store.update(book.id, patch).unwrap().unwrap();
        assert_eq!(updated.title, "X");
        assert_eq!(updated.author, "A");
        assert_eq!(store.get(book.id).unwrap(), Some(updated));
    })
}

#[test]
fn delete_twice() {
    with_stores(|store| {
        let book = store.create(NewBook::new("T", "A")).unwrap();
        assert_eq!(store.delete(book.id).unwrap(), true);
        assert_eq!(store.delete(book.id).unwrap(), false);
        assert_eq!(store.get(book.id).unwrap(), None);
    })
}

#[test]
fn create_then_get() {
    with_stores(|store| {
        let book = store.create(NewBook::new("T", "A")).unwrap();
        let found = store.get(book.id).unwrap().unwrap();
        assert_eq!(found.title, "T");
        assert_eq!(found.author, "A");
    })
}

fn create_concurrently(store: Arc<dyn BookStore>) {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|i| {
                        store
                            .create(NewBook::new(format!("T{}-{}", t, i), "A"))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let created = handle.join().unwrap();
        // Each thread sees its own ids in increasing order
        assert!(created.windows(2).all(|pair| pair[0] < pair[1]));
        for id in created {
            assert!(ids.insert(id), "duplicate id {}", id);
        }
    }
    assert_eq!(ids.len(), THREADS * PER_THREAD);
    assert_eq!(store.list().unwrap().len(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_creates_never_share_ids() {
    create_concurrently(Arc::new(InMemoryStore::new()));

    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(&logger(), dir.path().join("books.json")).unwrap();
    create_concurrently(Arc::new(store));
}

#[test]
fn seeded_store_assigns_ids_in_order() {
    let store = InMemoryStore::seeded(vec![
        NewBook::new("Dune", "Frank Herbert"),
        NewBook::new("Emma", "Jane Austen"),
    ])
    .unwrap();
    let books = store.list().unwrap();
    assert_eq!(
        books.iter().map(|b| b.id.as_i32()).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(store.create(NewBook::new("T", "A")).unwrap().id, id(3));
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.json");

    {
        let store = JsonFileStore::open(&logger(), &path).unwrap();
        store.create(NewBook::new("T1", "A1")).unwrap();
        let second = store.create(NewBook::new("T2", "A2")).unwrap();
        store.delete(second.id).unwrap();
    }

    let store = JsonFileStore::open(&logger(), &path).unwrap();
    let books = store.list().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "T1");
    // The id of the deleted book is not handed out again
    assert_eq!(store.create(NewBook::new("T3", "A3")).unwrap().id, id(3));
}

#[test]
fn file_store_seeds_only_when_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.json");
    let seed = || vec![NewBook::new("Dune", "Frank Herbert")];

    let store = JsonFileStore::open_seeded(&logger(), &path, seed()).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
    drop(store);

    let store = JsonFileStore::open_seeded(&logger(), &path, seed()).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn blank_data_files_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.json");

    std::fs::write(&path, "").unwrap();
    let store = JsonFileStore::open(&logger(), &path).unwrap();
    assert_eq!(store.list().unwrap(), vec![]);
    drop(store);

    std::fs::write(&path, " \n").unwrap();
    let seed = vec![NewBook::new("Dune", "Frank Herbert")];
    let store = JsonFileStore::open_seeded(&logger(), &path, seed).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
    drop(store);

    // The seeded snapshot replaced the blank file
    let store = JsonFileStore::open(&logger(), &path).unwrap();
    assert_eq!(store.list().unwrap()[0].title, "Dune");
    assert_eq!(store.create(NewBook::new("T", "A")).unwrap().id, id(2));
}

#[test]
fn file_store_repairs_stale_next_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.json");
    std::fs::write(
        &path,
        r#"{"next_id": 1, "books": [{"id": 7, "title": "T", "author": "A"}]}"#,
    )
    .unwrap();

    let store = JsonFileStore::open(&logger(), &path).unwrap();
    assert_eq!(store.create(NewBook::new("U", "B")).unwrap().id, id(8));
}

#[test]
fn file_store_rejects_corrupt_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.json");

    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(
        JsonFileStore::open(&logger(), &path),
        Err(StoreError::Corrupt(_))
    ));

    std::fs::write(
        &path,
        r#"{"next_id": 9, "books": [
            {"id": 2, "title": "T", "author": "A"},
            {"id": 2, "title": "U", "author": "B"}
        ]}"#,
    )
    .unwrap();
    assert!(matches!(
        JsonFileStore::open(&logger(), &path),
        Err(StoreError::Corrupt(_))
    ));
}

#[test]
fn failed_writes_have_no_effect() {
    let dir = tempfile::tempdir().unwrap();
    // The parent directory does not exist, so every snapshot write fails
    let path = dir.path().join("missing").join("books.json");
    let store = JsonFileStore::open(&logger(), &path).unwrap();

    assert!(matches!(
        store.create(NewBook::new("T", "A")),
        Err(StoreError::Persistence(_))
    ));
    assert_eq!(store.list().unwrap(), vec![]);

    std::fs::create_dir(dir.path().join("missing")).unwrap();
    // The failed create did not use up an id
    assert_eq!(store.create(NewBook::new("T", "A")).unwrap().id, id(1));
    assert!(path.exists());
}
