//! Command line option structs.
//!

pub mod sync_opts;

pub use crate::opts::sync_opts::SyncOpts;
