//! Error Types
//!
//! I/O and format failures surfaced by load/save.

use crate::storage::EmbeddingStore;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Format error on line {line}: {reason}")]
    Format { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failed load, carrying whatever was built before the failure.
///
/// `partial` is `None` when the file could not be read at all, and
/// `Some` when a strict load stopped on a malformed row.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct LoadError {
    #[source]
    pub error: Error,
    pub partial: Option<EmbeddingStore>,
}

impl LoadError {
    pub(crate) fn io(error: std::io::Error) -> Self {
        Self {
            error: Error::Io(error),
            partial: None,
        }
    }

    /// Take the partially populated store, if any
    pub fn into_partial(self) -> Option<EmbeddingStore> {
        self.partial
    }
}
