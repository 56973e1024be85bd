use serde::{Deserialize, Serialize};

/// One newline-delimited JSON record from an index metadata file.
///
/// The field names match the wire format of the crates.io index
/// (`name`, `vers`, `cksum`, `yanked`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CrateVersion {
    pub name: String,
    pub vers: String,
    pub cksum: String,
    #[serde(default)]
    pub yanked: bool,
}

impl std::fmt::Display for CrateVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.vers)
    }
}
