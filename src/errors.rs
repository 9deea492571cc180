//! Error types for observer.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error from an [`ItemStore`](crate::store::ItemStore) implementation.
pub type BoxedStoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for observer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The data directory could not be created.
    #[error("Failed to create data directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The item store could not be opened.
    #[error("Failed to open store at {path}: {source}")]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: BoxedStoreError,
    },

    /// An item or embedding write was rejected by the store.
    #[error("Store write failed: {0}")]
    StoreWrite(#[source] BoxedStoreError),
}

impl Error {
    pub(crate) fn store_open<E>(path: PathBuf, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::StoreOpen {
            path,
            source: Box::new(source),
        }
    }

    pub(crate) fn store_write<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::StoreWrite(Box::new(source))
    }
}
