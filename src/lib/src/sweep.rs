//! # Integrity Sweeper
//!
//! Reconciles the on-disk artifact tree with the catalog: stamps
//! `downloaded` for artifacts that exist, and re-inserts rows the catalog
//! lost for crates the index still advertises.
//!

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::error::MirrorError;
use crate::loader::{self, LoadMode};
use crate::model::CrateVersion;

lazy_static! {
    // <name>-<version>.crate, where the version starts with a digit so the
    // split point inside the dashed name is unambiguous
    static ref CRATE_FILENAME_RE: Regex = Regex::new(r"^(.+)-(\d+\..+)\.crate$").unwrap();
}

/// Walk the artifact tree and set `downloaded = 1` for every crate file
/// found. Files that do not look like crate artifacts are logged and
/// ignored. Returns how many files were stamped.
pub fn mark_downloaded_crates(
    catalog: &Catalog,
    crates_dir: impl AsRef<Path>,
) -> Result<usize, MirrorError> {
    let mut marked = 0;
    for entry in WalkDir::new(crates_dir.as_ref())
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy();
        let Some(caps) = CRATE_FILENAME_RE.captures(&filename) else {
            log::error!(
                "Failed to extract name and version from {:?}",
                entry.path()
            );
            continue;
        };
        let (name, version) = (&caps[1], &caps[2]);
        catalog.mark_downloaded(name, version, true)?;
        log::debug!("Info of {}-{} updated", name, version);
        marked += 1;
    }
    log::debug!("Swept {marked} crate files");
    Ok(marked)
}

/// Re-insert catalog rows for versions the index advertises but the catalog
/// lacks, e.g. after an interrupted bootstrap load. Existing rows are left
/// untouched. Returns how many rows were restored.
pub fn restore_missing_crates(
    catalog: &mut Catalog,
    index_dir: impl AsRef<Path>,
) -> Result<usize, MirrorError> {
    let mut restored = 0;
    for path in loader::walk_index(index_dir.as_ref()) {
        let versions = loader::load_crate_file(&path, LoadMode::Full)?;

        let mut missing: Vec<CrateVersion> = Vec::new();
        for version in versions {
            if !catalog.exists(&version.name, &version.vers)? {
                missing.push(version);
            }
        }
        if missing.is_empty() {
            continue;
        }

        log::info!("Restoring {} missing rows from {:?}", missing.len(), path);
        catalog.upsert_packages(&missing)?;
        restored += missing.len();
    }
    Ok(restored)
}
