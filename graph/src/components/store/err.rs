use thiserror::Error;

use crate::data::book::BookId;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Every positive `i32` has been handed out as an id.
    #[error("no book ids left after {0}")]
    IdSpaceExhausted(BookId),
    /// Writing to the backing storage failed; the operation had no effect.
    #[error("operation could not complete due to an error from the underlying storage: {0:#}")]
    Persistence(#[source] anyhow::Error),
    /// Data read from the backing storage is inconsistent.
    #[error("store data is corrupt: {0}")]
    Corrupt(String),
}
