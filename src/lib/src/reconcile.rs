//! # Reconciler
//!
//! Drives one full sync run: advance the index clone, reconcile the catalog
//! against the file-level change set, fetch pending artifacts, then record
//! the new commit in the history ledger. The ledger is only written on the
//! way out, so any fatal error leaves the previous entry in place and the
//! next run re-attempts the same delta.
//!

use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::error::MirrorError;
use crate::fetch::{self, FetchOpts};
use crate::index::IndexRepository;
use crate::loader::{self, LoadMode};
use crate::model::{ChangeKind, IndexChange};
use crate::opts::SyncOpts;
use crate::sweep;
use crate::util;

/// Sync the mirror with upstream once.
pub async fn sync(opts: &SyncOpts) -> Result<(), MirrorError> {
    let mut catalog = Catalog::open(&opts.db_path)?;
    util::fs::create_dir_all(&opts.crates_dir)?;
    let index = IndexRepository::ensure_cloned(&opts.index_url, &opts.index_dir)?;

    // Cold start: fill the catalog from the whole index tree before looking
    // at any diff
    if catalog.count_packages()? == 0 {
        bootstrap_catalog(&mut catalog, &index)?;
    }

    if opts.check_db {
        let restored = sweep::restore_missing_crates(&mut catalog, &opts.index_dir)?;
        log::info!("Database check restored {restored} rows");
    }

    let fetch_opts = FetchOpts {
        crates_dir: opts.crates_dir.clone(),
        download_url: opts.download_url.clone(),
    };

    let Some(last) = catalog.last_commit()? else {
        // First run that ever completes: no delta to compute, just download
        // everything pending and start the ledger
        index.reset_head_to_upstream()?;
        fetch::fetch_pending(&catalog, &fetch_opts).await?;
        catalog.record_commit(&index.current_commit()?)?;
        amend_config(&index, opts)?;
        return Ok(());
    };

    log::debug!("Last commit: {}", last.commit_id);

    index.reset_head_to_upstream()?;
    log::info!("Pulling from remote...");
    index.pull()?;
    let head = index.current_commit()?;
    log::debug!("Latest commit: {}", head);

    let changes = index.diff(&last.commit_id, &head)?;
    let (deleted_names, added_files, modified_files) = classify_changes(&changes);

    log::debug!("deleted: {:?}", deleted_names);
    log::debug!("newfiles: {:?}", added_files);
    log::debug!("modified: {:?}", modified_files);

    // Deletions first, then additions, then modifications, so that a rename
    // composes as delete-old + load-new
    for name in &deleted_names {
        catalog.delete_package(name)?;
    }
    for relpath in &added_files {
        let versions = loader::load_crate_file(opts.index_dir.join(relpath), LoadMode::Full)?;
        catalog.upsert_packages(&versions)?;
    }
    for relpath in &modified_files {
        let versions =
            loader::load_crate_file(opts.index_dir.join(relpath), LoadMode::LatestOnly)?;
        catalog.upsert_packages(&versions)?;
    }

    fetch::fetch_pending(&catalog, &fetch_opts).await?;

    for name in &deleted_names {
        let crate_dir = opts.crates_dir.join(name);
        if crate_dir.is_dir() {
            log::info!("Removing artifacts of deleted crate {name}");
            util::fs::remove_dir_all(&crate_dir)?;
        }
    }

    catalog.record_commit(&head)?;
    amend_config(&index, opts)?;
    Ok(())
}

fn bootstrap_catalog(
    catalog: &mut Catalog,
    index: &IndexRepository,
) -> Result<(), MirrorError> {
    log::info!("Catalog is empty, loading the full index");
    let mut loaded = 0;
    for path in loader::walk_index(index.path()) {
        let versions = loader::load_crate_file(&path, LoadMode::Full)?;
        loaded += versions.len();
        catalog.upsert_packages(&versions)?;
    }
    log::info!("Loaded {loaded} crate versions from the index");
    Ok(())
}

fn amend_config(index: &IndexRepository, opts: &SyncOpts) -> Result<(), MirrorError> {
    let Some(config) = &opts.config else {
        return Ok(());
    };
    index.amend_config(config)
}

/// Split the diff into deleted package names, files to Full-load and files
/// to LatestOnly-load. The package name of a deleted file is its basename;
/// that is how the index names its metadata files.
fn classify_changes(changes: &[IndexChange]) -> (Vec<String>, Vec<PathBuf>, Vec<PathBuf>) {
    let mut deleted_names: Vec<String> = Vec::new();
    let mut added_files: Vec<PathBuf> = Vec::new();
    let mut modified_files: Vec<PathBuf> = Vec::new();

    for change in changes {
        match &change.kind {
            ChangeKind::Added => added_files.push(change.path.clone()),
            ChangeKind::Modified => modified_files.push(change.path.clone()),
            ChangeKind::Deleted => {
                if let Some(name) = package_name(&change.path) {
                    deleted_names.push(name);
                }
            }
            ChangeKind::Renamed { from } => {
                if let Some(name) = package_name(from) {
                    deleted_names.push(name);
                }
                added_files.push(change.path.clone());
            }
        }
    }

    (deleted_names, added_files, modified_files)
}

fn package_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::model::IndexChange;
    use crate::reconcile::classify_changes;

    #[test]
    fn rename_composes_as_delete_plus_add() {
        let changes = vec![
            IndexChange::renamed("aa/ho/aho", "ah/-o/ah-o"),
            IndexChange::deleted("de/le/deleteme"),
            IndexChange::added("se/rd/serde"),
            IndexChange::modified("to/ki/tokio"),
        ];

        let (deleted, added, modified) = classify_changes(&changes);
        assert_eq!(deleted, vec!["aho".to_string(), "deleteme".to_string()]);
        assert_eq!(
            added,
            vec![PathBuf::from("ah/-o/ah-o"), PathBuf::from("se/rd/serde")]
        );
        assert_eq!(modified, vec![PathBuf::from("to/ki/tokio")]);
    }
}
