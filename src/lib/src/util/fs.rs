//! Wrapper around std::fs commands to make them easier to use
//! and keep the path in the error message
//!

use std::path::Path;

use crate::error::MirrorError;

pub fn create_dir_all(path: impl AsRef<Path>) -> Result<(), MirrorError> {
    let path = path.as_ref();
    std::fs::create_dir_all(path).map_err(|e| MirrorError::dir_create_error(path, e))
}

pub fn read(path: impl AsRef<Path>) -> Result<Vec<u8>, MirrorError> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| MirrorError::file_read_error(path, e))
}

pub fn read_to_string(path: impl AsRef<Path>) -> Result<String, MirrorError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| MirrorError::file_read_error(path, e))
}

pub fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<(), MirrorError> {
    let path = path.as_ref();
    std::fs::write(path, contents).map_err(|e| MirrorError::file_create_error(path, e))
}

pub fn remove_file(path: impl AsRef<Path>) -> Result<(), MirrorError> {
    let path = path.as_ref();
    std::fs::remove_file(path).map_err(|e| MirrorError::file_remove_error(path, e))
}

pub fn remove_dir_all(path: impl AsRef<Path>) -> Result<(), MirrorError> {
    let path = path.as_ref();
    std::fs::remove_dir_all(path).map_err(|e| {
        MirrorError::basic_str(format!("Could not remove directory: {path:?} error {e:?}"))
    })
}

pub fn rename(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<(), MirrorError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    std::fs::rename(src, dst).map_err(|e| MirrorError::file_rename_error(src, dst, e))
}

/// True when `path` is missing, or is a directory with no entries.
pub fn is_missing_or_empty_dir(path: impl AsRef<Path>) -> Result<bool, MirrorError> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Ok(true);
    }
    let mut entries = std::fs::read_dir(path).map_err(|e| MirrorError::file_read_error(path, e))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use crate::error::MirrorError;
    use crate::test;
    use crate::util;

    #[test]
    fn is_missing_or_empty_dir_detects_all_states() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            assert!(util::fs::is_missing_or_empty_dir(dir.join("nope"))?);
            assert!(util::fs::is_missing_or_empty_dir(dir)?);

            test::write_txt_file_to_path(dir.join("some.crate"), "bytes")?;
            assert!(!util::fs::is_missing_or_empty_dir(dir)?);

            Ok(())
        })
    }
}
