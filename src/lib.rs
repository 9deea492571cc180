//! observer - test fixtures for the observer item store.
//!
//! This crate seeds a local SQLite item store with deterministic data and
//! samples stream output with a short read deadline. All operations are
//! synchronous.
//!
//! # Example
//!
//! ```no_run
//! use std::os::unix::net::UnixStream;
//! use observer::{DeadlineStream, read_snapshot, seed};
//!
//! let home = std::env::temp_dir().join("observer-fixture");
//! seed(&home).expect("Failed to seed fixture store");
//!
//! let (reader, _writer) = UnixStream::pair().expect("socket pair");
//! let mut stream = DeadlineStream::new(reader);
//! let output = read_snapshot(&mut stream);
//! println!("captured {} bytes", output.len());
//! ```

pub mod config;
pub mod errors;
pub mod fixture;
pub mod item;
pub mod snapshot;
pub mod store;
mod sqlite;

// Re-export public API
pub use config::Config;
pub use errors::Error;
pub use fixture::{FIXTURE_EMBEDDING, FIXTURE_ITEM_ID, PUBLISHED_OFFSET, fixture_item, seed, seed_with};
pub use item::Item;
pub use snapshot::{
    DeadlineRead, DeadlineStream, ReadTimeout, SnapshotOptions, read_snapshot, read_snapshot_with,
};
pub use sqlite::{Database, Error as StoreError};
pub use store::{ItemStore, StoreSession};
