//! Item store contract and scoped store sessions.

use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::item::Item;

/// Persistence operations the fixture seeder relies on.
pub trait ItemStore {
    /// Store-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a batch of items, returning how many were saved.
    fn save_items(&mut self, items: &[Item]) -> Result<usize, Self::Error>;

    /// Persist the embedding vector for an existing item.
    fn save_embedding(&mut self, item_id: &str, vector: &[f32]) -> Result<(), Self::Error>;

    /// Release the store handle.
    fn close(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}

/// Owns an open store and closes it exactly once.
///
/// The store is closed by [`StoreSession::close`] or, on any other exit path,
/// when the session is dropped. Close failures during drop are logged.
///
/// # Invariant
///
/// `store` is `Some` for as long as the session can be observed. It is only
/// taken by `close` (which consumes the session) and by `drop`, so `Deref`
/// and `DerefMut` never see `None`.
pub struct StoreSession<S: ItemStore> {
    store: Option<S>,
}

impl<S: ItemStore> StoreSession<S> {
    pub fn new(store: S) -> Self {
        Self { store: Some(store) }
    }

    /// Close the store and report the close result.
    ///
    /// # Errors
    ///
    /// Returns the store's error if releasing the handle fails.
    pub fn close(mut self) -> Result<(), S::Error> {
        match self.store.take() {
            Some(store) => store.close(),
            None => Ok(()),
        }
    }
}

impl<S: ItemStore> Deref for StoreSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        match &self.store {
            Some(store) => store,
            None => unreachable!("store session used after close"),
        }
    }
}

impl<S: ItemStore> DerefMut for StoreSession<S> {
    fn deref_mut(&mut self) -> &mut S {
        match &mut self.store {
            Some(store) => store,
            None => unreachable!("store session used after close"),
        }
    }
}

impl<S: ItemStore> Drop for StoreSession<S> {
    fn drop(&mut self) {
        if let Some(store) = self.store.take() {
            if let Err(e) = store.close() {
                warn!(error = %e, "failed to close item store");
            }
        }
    }
}
