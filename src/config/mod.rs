//! Data-directory layout for observer.

use std::path::{Path, PathBuf};

/// Name of the data directory created under the home directory.
pub const DATA_DIR_NAME: &str = ".observer";
/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "observer.db";

/// Resolved locations of the observer data directory and database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding all observer state (`<home>/.observer`).
    pub data_dir: PathBuf,

    /// Path to the SQLite database (`<home>/.observer/observer.db`).
    pub database_path: PathBuf,
}

impl Config {
    /// Build the layout rooted at `home`, taken exactly as given.
    pub fn for_home(home: &Path) -> Self {
        let data_dir = home.join(DATA_DIR_NAME);
        Self {
            database_path: data_dir.join(DATABASE_FILE_NAME),
            data_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_home_layout() {
        let config = Config::for_home(Path::new("/tmp/fixture-home"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/fixture-home/.observer"));
        assert_eq!(
            config.database_path,
            PathBuf::from("/tmp/fixture-home/.observer/observer.db")
        );
    }

    #[test]
    fn test_for_home_keeps_parent_components() {
        let config = Config::for_home(Path::new("/tmp/a/../b"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/a/../b/.observer"));
    }

    #[test]
    fn test_for_home_does_not_expand_tilde() {
        let config = Config::for_home(Path::new("~/fixture"));
        assert_eq!(config.data_dir, PathBuf::from("~/fixture/.observer"));
        assert_eq!(
            config.database_path,
            PathBuf::from("~/fixture/.observer/observer.db")
        );
    }
}
