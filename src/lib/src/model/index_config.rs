use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_API_URL, DEFAULT_DL_URL};

/// The `config.json` document at the root of the registry index.
///
/// Downstream cargo clients read `dl` to locate artifacts, so pointing it at
/// the operator's own endpoint is what makes the mirror usable.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub dl: String,
    pub api: String,
}

impl Default for IndexConfig {
    fn default() -> IndexConfig {
        IndexConfig {
            dl: DEFAULT_DL_URL.to_string(),
            api: DEFAULT_API_URL.to_string(),
        }
    }
}
