//! libmirror
//!
//! Library powering the `crates-mirror` binary: keeps a local clone of the
//! crates.io registry index, a SQLite catalog of every advertised crate
//! version, and a directory tree of verified `.crate` artifacts in sync with
//! upstream.
//! - `crates-mirror` to run one sync cycle
//! - `crates-mirror -c` to repair the catalog before syncing
//!

pub mod catalog;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod index;
pub mod loader;
pub mod model;
pub mod opts;
pub mod reconcile;
pub mod sweep;
pub mod util;
