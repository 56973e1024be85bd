//! Errors for the mirror library
//!
//! Enumeration for all errors that can occur while syncing the mirror
//!

use derive_more::{Display, Error};
use std::fmt;
use std::io;
use std::path::Path;

/// Plain-text detail for errors that have no richer source. Implements
/// `std::error::Error` so a message can sit at the bottom of a source
/// chain.
#[derive(Debug)]
pub struct Message(String);

impl Message {
    pub fn new(msg: impl Into<String>) -> Message {
        Message(msg.into())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

#[derive(Debug, Display, Error)]
pub enum MirrorError {
    // Index repository
    BranchNotFound(Message),
    CommitNotFound(Message),
    CannotFastForward(Message),

    // Filesystem
    PathDoesNotExist(Message),

    // External library errors
    IO(io::Error),
    Git(git2::Error),
    DB(rusqlite::Error),
    HTTP(reqwest::Error),
    JSON(serde_json::Error),

    // Fallback
    Basic(Message),
}

impl MirrorError {
    pub fn basic_str(s: impl AsRef<str>) -> Self {
        MirrorError::Basic(Message::new(s.as_ref()))
    }

    pub fn branch_not_found(name: impl AsRef<str>) -> Self {
        let msg = format!("Branch '{}' not found", name.as_ref());
        MirrorError::BranchNotFound(Message::new(msg))
    }

    pub fn commit_not_found(commit_id: impl AsRef<str>) -> Self {
        let msg = format!("Could not find commit: {}", commit_id.as_ref());
        MirrorError::CommitNotFound(Message::new(msg))
    }

    pub fn cannot_fast_forward(branch: impl AsRef<str>) -> Self {
        let msg = format!(
            "Local branch '{}' has diverged from upstream and cannot be fast-forwarded",
            branch.as_ref()
        );
        MirrorError::CannotFastForward(Message::new(msg))
    }

    pub fn path_does_not_exist(path: impl AsRef<Path>) -> Self {
        let msg = format!("Path does not exist: {:?}", path.as_ref());
        MirrorError::PathDoesNotExist(Message::new(msg))
    }

    pub fn file_create_error(path: impl AsRef<Path>, error: io::Error) -> Self {
        let msg = format!(
            "Could not create file: {:?} error {:?}",
            path.as_ref(),
            error
        );
        MirrorError::basic_str(msg)
    }

    pub fn file_read_error(path: impl AsRef<Path>, error: io::Error) -> Self {
        let msg = format!("Could not read file: {:?} error {:?}", path.as_ref(), error);
        MirrorError::basic_str(msg)
    }

    pub fn dir_create_error(path: impl AsRef<Path>, error: io::Error) -> Self {
        let msg = format!(
            "Could not create directory: {:?} error {:?}",
            path.as_ref(),
            error
        );
        MirrorError::basic_str(msg)
    }

    pub fn file_remove_error(path: impl AsRef<Path>, error: io::Error) -> Self {
        let msg = format!(
            "Could not remove file: {:?} error {:?}",
            path.as_ref(),
            error
        );
        MirrorError::basic_str(msg)
    }

    pub fn file_rename_error(
        src: impl AsRef<Path>,
        dst: impl AsRef<Path>,
        error: io::Error,
    ) -> Self {
        let msg = format!(
            "File rename error: {error:?}\nCould not move from `{:?}` to `{:?}`",
            src.as_ref(),
            dst.as_ref()
        );
        MirrorError::basic_str(msg)
    }
}

// if you do not want to call .map_err, implement the std::convert::From trait
impl From<io::Error> for MirrorError {
    fn from(error: io::Error) -> Self {
        MirrorError::IO(error)
    }
}

impl From<String> for MirrorError {
    fn from(error: String) -> Self {
        MirrorError::Basic(Message::new(error))
    }
}

impl From<git2::Error> for MirrorError {
    fn from(error: git2::Error) -> Self {
        MirrorError::Git(error)
    }
}

impl From<rusqlite::Error> for MirrorError {
    fn from(error: rusqlite::Error) -> Self {
        MirrorError::DB(error)
    }
}

impl From<reqwest::Error> for MirrorError {
    fn from(error: reqwest::Error) -> Self {
        MirrorError::HTTP(error)
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(error: serde_json::Error) -> Self {
        MirrorError::JSON(error)
    }
}
