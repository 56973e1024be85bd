use std::path::{Path, PathBuf};

use crate::constants::{
    DB_FILENAME, DEFAULT_CRATES_DIR, DEFAULT_DOWNLOAD_URL, DEFAULT_INDEX_DIR, INDEX_UPSTREAM_URL,
};
use crate::model::IndexConfig;

/// Everything one sync run needs to know.
#[derive(Clone, Debug)]
pub struct SyncOpts {
    /// Working tree of the registry index clone.
    pub index_dir: PathBuf,
    /// Root of the artifact tree, one subdirectory per crate name.
    pub crates_dir: PathBuf,
    /// Catalog database file.
    pub db_path: PathBuf,
    /// Where to clone the index from when `index_dir` is missing or empty.
    pub index_url: String,
    /// Artifact endpoint template with `{name}` and `{version}` placeholders.
    pub download_url: String,
    /// Run the missing-crates repair before syncing.
    pub check_db: bool,
    /// Endpoint overrides committed into the mirrored `config.json`;
    /// `None` skips the amend commit entirely.
    pub config: Option<IndexConfig>,
}

impl SyncOpts {
    pub fn new(index_dir: impl AsRef<Path>, crates_dir: impl AsRef<Path>) -> SyncOpts {
        SyncOpts {
            index_dir: index_dir.as_ref().to_path_buf(),
            crates_dir: crates_dir.as_ref().to_path_buf(),
            db_path: PathBuf::from(DB_FILENAME),
            index_url: INDEX_UPSTREAM_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            check_db: false,
            config: None,
        }
    }

    /// A `--dbpath` pointing at a directory gets `crates.db` appended.
    pub fn resolve_db_path(path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_dir() {
            path.join(DB_FILENAME)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for SyncOpts {
    fn default() -> SyncOpts {
        SyncOpts::new(DEFAULT_INDEX_DIR, DEFAULT_CRATES_DIR)
    }
}
