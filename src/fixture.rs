//! Deterministic fixture data for tests that need a populated item store.
//!
//! [`seed`] creates `<home>/.observer/`, opens `observer.db` inside it and
//! writes one item plus its embedding. Every field is a literal except the
//! two timestamps, which are relative to the time of the call.

use std::fs::DirBuilder;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::Error;
use crate::item::Item;
use crate::sqlite::Database;
use crate::store::{ItemStore, StoreSession};

/// Identifier of the seeded item.
pub const FIXTURE_ITEM_ID: &str = "item-1";
/// Embedding stored for the seeded item.
pub const FIXTURE_EMBEDDING: [f32; 3] = [0.2, 0.1, 0.4];
/// How long before the fetch time the seeded item was published.
pub const PUBLISHED_OFFSET: Duration = Duration::minutes(10);

/// Permission bits for the data directory (rwxr-xr-x).
#[cfg(unix)]
const DATA_DIR_MODE: u32 = 0o755;

/// Build the seeded item as fetched at `now`.
pub fn fixture_item(now: DateTime<Utc>) -> Item {
    Item {
        id: FIXTURE_ITEM_ID.to_string(),
        source_type: "rss".to_string(),
        source_name: "Fixture Feed".to_string(),
        title: "Fixture item".to_string(),
        summary: "Deterministic item used by tests".to_string(),
        url: "https://example.com/item-1".to_string(),
        author: "observer".to_string(),
        published_at: now - PUBLISHED_OFFSET,
        fetched_at: now,
    }
}

/// Seed the SQLite store under `home` with the fixture item and embedding.
///
/// # Errors
///
/// Returns `Error::Directory` if the data directory cannot be created,
/// `Error::StoreOpen` if the database cannot be opened, and
/// `Error::StoreWrite` if either write fails.
pub fn seed(home: &Path) -> Result<(), Error> {
    seed_with(home, Database::open)
}

/// Seed a store opened by `open` at `<home>/.observer/observer.db`.
///
/// The opened store is closed exactly once, whether or not the writes
/// succeed. Nothing is closed when `open` itself fails.
///
/// # Errors
///
/// Same as [`seed`].
pub fn seed_with<S, F>(home: &Path, open: F) -> Result<(), Error>
where
    S: ItemStore,
    F: FnOnce(&Path) -> Result<S, S::Error>,
{
    let config = Config::for_home(home);
    create_data_dir(&config.data_dir)?;

    let store = open(&config.database_path)
        .map_err(|e| Error::store_open(config.database_path.clone(), e))?;
    let mut session = StoreSession::new(store);

    let item = fixture_item(Utc::now());
    let saved = session
        .save_items(std::slice::from_ref(&item))
        .map_err(Error::store_write)?;
    debug!(saved, item_id = %item.id, "saved fixture items");

    session
        .save_embedding(&item.id, &FIXTURE_EMBEDDING)
        .map_err(Error::store_write)?;

    // A failed close after successful writes does not fail the seed.
    drop(session);

    info!(path = %config.database_path.display(), "seeded fixture store");
    Ok(())
}

fn create_data_dir(path: &Path) -> Result<(), Error> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DATA_DIR_MODE);
    }
    builder.create(path).map_err(|source| Error::Directory {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct Rejected(&'static str);

    impl std::fmt::Display for Rejected {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "rejected: {}", self.0)
        }
    }

    impl std::error::Error for Rejected {}

    #[derive(Default)]
    struct Calls {
        items: Vec<Item>,
        embeddings: Vec<(String, Vec<f32>)>,
        closes: usize,
    }

    struct RecordingStore {
        calls: Rc<RefCell<Calls>>,
        fail_items: bool,
        fail_embedding: bool,
    }

    impl ItemStore for RecordingStore {
        type Error = Rejected;

        fn save_items(&mut self, items: &[Item]) -> Result<usize, Rejected> {
            if self.fail_items {
                return Err(Rejected("items"));
            }
            self.calls.borrow_mut().items.extend_from_slice(items);
            Ok(items.len())
        }

        fn save_embedding(&mut self, item_id: &str, vector: &[f32]) -> Result<(), Rejected> {
            if self.fail_embedding {
                return Err(Rejected("embedding"));
            }
            self.calls
                .borrow_mut()
                .embeddings
                .push((item_id.to_string(), vector.to_vec()));
            Ok(())
        }

        fn close(self) -> Result<(), Rejected> {
            self.calls.borrow_mut().closes += 1;
            Ok(())
        }
    }

    fn run(fail_items: bool, fail_embedding: bool) -> (Result<(), Error>, Rc<RefCell<Calls>>, PathBuf) {
        let home = TempDir::new().unwrap();
        let calls = Rc::new(RefCell::new(Calls::default()));
        let opened_at = Rc::new(RefCell::new(PathBuf::new()));

        let result = {
            let calls = Rc::clone(&calls);
            let opened_at = Rc::clone(&opened_at);
            seed_with(home.path(), move |path: &Path| {
                *opened_at.borrow_mut() = path.to_path_buf();
                Ok::<_, Rejected>(RecordingStore {
                    calls,
                    fail_items,
                    fail_embedding,
                })
            })
        };

        let relative = opened_at
            .borrow()
            .strip_prefix(home.path())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        (result, calls, relative)
    }

    #[test]
    fn test_fixture_item_literals() {
        let now = Utc::now();
        let item = fixture_item(now);
        assert_eq!(item.id, "item-1");
        assert_eq!(item.source_type, "rss");
        assert_eq!(item.source_name, "Fixture Feed");
        assert_eq!(item.title, "Fixture item");
        assert_eq!(item.summary, "Deterministic item used by tests");
        assert_eq!(item.url, "https://example.com/item-1");
        assert_eq!(item.author, "observer");
        assert_eq!(item.fetched_at, now);
        assert_eq!(item.fetched_at - item.published_at, Duration::minutes(10));
    }

    #[test]
    fn test_seed_with_writes_item_then_embedding_and_closes() {
        let (result, calls, opened) = run(false, false);
        result.unwrap();

        let calls = calls.borrow();
        assert_eq!(opened, PathBuf::from(".observer/observer.db"));
        assert_eq!(calls.items.len(), 1);
        assert_eq!(calls.items[0].id, FIXTURE_ITEM_ID);
        assert_eq!(
            calls.embeddings,
            vec![("item-1".to_string(), vec![0.2f32, 0.1, 0.4])]
        );
        assert_eq!(calls.closes, 1);
    }

    #[test]
    fn test_seed_with_item_failure_closes_once() {
        let (result, calls, _) = run(true, false);

        assert!(matches!(result, Err(Error::StoreWrite(_))));
        let calls = calls.borrow();
        assert!(calls.embeddings.is_empty());
        assert_eq!(calls.closes, 1);
    }

    #[test]
    fn test_seed_with_embedding_failure_closes_once() {
        let (result, calls, _) = run(false, true);

        assert!(matches!(result, Err(Error::StoreWrite(_))));
        let calls = calls.borrow();
        assert_eq!(calls.items.len(), 1);
        assert_eq!(calls.closes, 1);
    }

    #[test]
    fn test_seed_with_open_failure() {
        let home = TempDir::new().unwrap();
        let result = seed_with(home.path(), |_: &Path| {
            Err::<RecordingStore, _>(Rejected("open"))
        });

        match result {
            Err(Error::StoreOpen { path, .. }) => {
                assert_eq!(path, home.path().join(".observer").join("observer.db"));
            }
            other => panic!("Expected StoreOpen error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_data_dir_is_idempotent() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join("a").join("b");
        create_data_dir(&dir).unwrap();
        create_data_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
