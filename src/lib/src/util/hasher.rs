use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::MirrorError;
use crate::util;

/// Lowercase hex SHA-256 of a buffer, the checksum format used by the
/// registry index.
pub fn hash_buffer(buffer: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(buffer);
    hex::encode(hasher.finalize())
}

pub fn hash_file_contents(path: impl AsRef<Path>) -> Result<String, MirrorError> {
    let buffer = util::fs::read(path)?;
    Ok(hash_buffer(&buffer))
}
