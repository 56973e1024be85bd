use std::path::PathBuf;

/// How a metadata file changed between two index commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed { from: PathBuf },
}

/// A file-level change in the index working tree, paths relative to the
/// repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl IndexChange {
    pub fn added(path: impl Into<PathBuf>) -> Self {
        IndexChange {
            path: path.into(),
            kind: ChangeKind::Added,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        IndexChange {
            path: path.into(),
            kind: ChangeKind::Modified,
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        IndexChange {
            path: path.into(),
            kind: ChangeKind::Deleted,
        }
    }

    pub fn renamed(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        IndexChange {
            path: to.into(),
            kind: ChangeKind::Renamed { from: from.into() },
        }
    }
}
