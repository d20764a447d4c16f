//! Book stores that keep their data in the process.
//!
//! [`InMemoryStore`] lives and dies with the process; [`JsonFileStore`]
//! additionally writes a snapshot of every change to a JSON file so that
//! books and their ids survive a restart.

mod books;
mod file;
mod memory;

pub use self::file::JsonFileStore;
pub use self::memory::InMemoryStore;
