//! # Metadata Loader
//!
//! Parses the per-package metadata files of the registry index: one JSON
//! object per line, newest version last. This is the only module that
//! interprets the index file format.
//!

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::constants::{GIT_HIDDEN_DIR, INDEX_CONFIG_FILENAME};
use crate::error::MirrorError;
use crate::model::CrateVersion;
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Every non-blank line of the file.
    Full,
    /// Only the final non-blank line. Used for files the diff classified as
    /// modified, relying on upstream appending new versions at the end.
    LatestOnly,
}

/// Parse one metadata file into crate versions.
///
/// Blank lines are ignored. A line that fails to parse is logged and
/// skipped; it never aborts the batch.
pub fn load_crate_file(
    path: impl AsRef<Path>,
    mode: LoadMode,
) -> Result<Vec<CrateVersion>, MirrorError> {
    let path = path.as_ref();
    let contents = util::fs::read_to_string(path)?;

    let lines = contents.lines().filter(|line| !line.trim().is_empty());
    let lines: Vec<&str> = match mode {
        LoadMode::Full => lines.collect(),
        LoadMode::LatestOnly => lines.last().into_iter().collect(),
    };

    let mut versions: Vec<CrateVersion> = Vec::with_capacity(lines.len());
    for line in lines {
        match serde_json::from_str::<CrateVersion>(line) {
            Ok(version) => versions.push(version),
            Err(_) => {
                log::error!("Unknown data in {:?}: {}", path, line);
            }
        }
    }

    // The count makes it visible in the logs when upstream rewrote a file
    // instead of appending to it
    log::debug!("Loaded {} versions from {:?}", versions.len(), path);
    Ok(versions)
}

/// All metadata file paths under `root`, skipping the `.git/` subtree and
/// the repository-root `config.json`.
pub fn walk_index(root: impl AsRef<Path>) -> Vec<PathBuf> {
    let root = root.as_ref();
    let config_path = root.join(INDEX_CONFIG_FILENAME);
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != OsStr::new(GIT_HIDDEN_DIR))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| *path != config_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::error::MirrorError;
    use crate::loader::{self, LoadMode};
    use crate::test;
    use crate::util;

    #[test]
    fn full_load_reads_every_line() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let path = dir.join("aho");
            test::write_txt_file_to_path(
                &path,
                r#"{"name":"aho","vers":"0.1.0","cksum":"aa","yanked":false}
{"name":"aho","vers":"0.2.0","cksum":"bb","yanked":true}"#,
            )?;

            let versions = loader::load_crate_file(&path, LoadMode::Full)?;
            assert_eq!(versions.len(), 2);
            assert_eq!(versions[0].vers, "0.1.0");
            assert!(!versions[0].yanked);
            assert_eq!(versions[1].vers, "0.2.0");
            assert!(versions[1].yanked);

            Ok(())
        })
    }

    #[test]
    fn latest_only_reads_final_line() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let path = dir.join("aho");
            test::write_txt_file_to_path(
                &path,
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}\n\n{\"name\":\"aho\",\"vers\":\"0.2.0\",\"cksum\":\"bb\",\"yanked\":false}\n\n",
            )?;

            let versions = loader::load_crate_file(&path, LoadMode::LatestOnly)?;
            assert_eq!(versions.len(), 1);
            assert_eq!(versions[0].vers, "0.2.0");

            Ok(())
        })
    }

    #[test]
    fn malformed_lines_are_skipped() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let path = dir.join("aho");
            test::write_txt_file_to_path(
                &path,
                "not json at all\n{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}\n{\"broken\":",
            )?;

            let versions = loader::load_crate_file(&path, LoadMode::Full)?;
            assert_eq!(versions.len(), 1);
            assert_eq!(versions[0].name, "aho");

            Ok(())
        })
    }

    #[test]
    fn missing_yanked_defaults_to_false() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let path = dir.join("aho");
            test::write_txt_file_to_path(
                &path,
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\"}",
            )?;

            let versions = loader::load_crate_file(&path, LoadMode::Full)?;
            assert_eq!(versions.len(), 1);
            assert!(!versions[0].yanked);

            Ok(())
        })
    }

    #[test]
    fn walk_index_skips_git_and_root_config() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            util::fs::create_dir_all(dir.join("aa").join("ho"))?;
            util::fs::create_dir_all(dir.join(".git"))?;
            test::write_txt_file_to_path(dir.join("aa").join("ho").join("aho"), "{}")?;
            test::write_txt_file_to_path(dir.join("config.json"), "{}")?;
            test::write_txt_file_to_path(dir.join(".git").join("HEAD"), "ref: nope")?;

            let files = loader::walk_index(dir);
            assert_eq!(files.len(), 1);
            assert!(files[0].ends_with("aa/ho/aho"));

            Ok(())
        })
    }
}
