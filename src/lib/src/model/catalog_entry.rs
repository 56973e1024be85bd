/// A full row of the `crate` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub version: String,
    pub checksum: String,
    pub yanked: bool,
    pub downloaded: bool,
    pub forbidden: bool,
    pub last_update: Option<String>,
}
