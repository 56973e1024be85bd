//! The structs and enums that are used to represent the data in the mirror library
//!

pub mod catalog_entry;
pub mod crate_version;
pub mod history_entry;
pub mod index_change;
pub mod index_config;
pub mod pending_crate;

// Index metadata
pub use crate::model::crate_version::CrateVersion;
pub use crate::model::index_change::{ChangeKind, IndexChange};
pub use crate::model::index_config::IndexConfig;

// Catalog
pub use crate::model::catalog_entry::CatalogEntry;
pub use crate::model::history_entry::HistoryEntry;
pub use crate::model::pending_crate::PendingCrate;
