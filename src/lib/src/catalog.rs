//! # Catalog
//!
//! The durable catalog of every crate version the index advertises, plus the
//! ledger of successfully synced index commits. One row per
//! `(name, version)`; the download workers never touch this directly, their
//! results are applied by a single writer task (see [`crate::fetch`]).
//!

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::MirrorError;
use crate::model::{CatalogEntry, CrateVersion, HistoryEntry, PendingCrate};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS crate (
    id integer primary key,
    name text,
    version text,
    checksum text,
    yanked integer default 0,
    downloaded integer default 0,
    forbidden integer default 0,
    last_update text
);
CREATE UNIQUE INDEX IF NOT EXISTS crate_index ON crate(name, version);
CREATE TABLE IF NOT EXISTS update_history (
    commit_id text,
    timestamp text
);
CREATE UNIQUE INDEX IF NOT EXISTS commit_index ON update_history(commit_id);
";

// Replaces the row on conflict. Status flags survive the replacement only
// when the checksum is unchanged; a new checksum means a new artifact, so
// both flags drop back to 0 and the fetcher picks the row up again.
const UPSERT_SQL: &str = "
INSERT INTO crate (name, version, checksum, yanked) VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(name, version) DO UPDATE SET
    checksum = excluded.checksum,
    yanked = excluded.yanked,
    downloaded = CASE WHEN crate.checksum = excluded.checksum THEN crate.downloaded ELSE 0 END,
    forbidden = CASE WHEN crate.checksum = excluded.checksum THEN crate.forbidden ELSE 0 END
";

pub struct Catalog {
    conn: Connection,
    path: PathBuf,
}

impl Catalog {
    /// Open (or create) the catalog database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Catalog, MirrorError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Catalog { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace rows keyed by `(name, version)` in one transaction.
    pub fn upsert_packages(&mut self, rows: &[CrateVersion]) -> Result<(), MirrorError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for row in rows {
                log::debug!(
                    "Load {}, {}, {}, {}",
                    row.name,
                    row.vers,
                    row.cksum,
                    row.yanked as i32
                );
                stmt.execute(params![row.name, row.vers, row.cksum, row.yanked as i32])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove every version of `name`.
    pub fn delete_package(&self, name: &str) -> Result<(), MirrorError> {
        self.conn
            .execute("DELETE FROM crate WHERE name = ?1", [name])?;
        Ok(())
    }

    /// Rows whose artifact still needs to be fetched.
    pub fn pending_downloads(&self) -> Result<Vec<PendingCrate>, MirrorError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, version, checksum FROM crate WHERE downloaded = 0 AND forbidden = 0",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PendingCrate {
                name: row.get(0)?,
                version: row.get(1)?,
                checksum: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Stamp the outcome of a download attempt. A successful download also
    /// clears `forbidden` so a row can never carry both flags.
    pub fn mark_downloaded(
        &self,
        name: &str,
        version: &str,
        ok: bool,
    ) -> Result<(), MirrorError> {
        if ok {
            self.conn.execute(
                "UPDATE crate SET downloaded = 1, forbidden = 0, last_update = ?1 WHERE name = ?2 AND version = ?3",
                params![now(), name, version],
            )?;
        } else {
            self.conn.execute(
                "UPDATE crate SET downloaded = 0, last_update = ?1 WHERE name = ?2 AND version = ?3",
                params![now(), name, version],
            )?;
        }
        Ok(())
    }

    /// Tombstone a version whose artifact the CDN refuses to serve.
    pub fn mark_forbidden(&self, name: &str, version: &str) -> Result<(), MirrorError> {
        self.conn.execute(
            "UPDATE crate SET forbidden = 1, last_update = ?1 WHERE name = ?2 AND version = ?3",
            params![now(), name, version],
        )?;
        Ok(())
    }

    /// The most recently recorded index commit, if any run ever completed.
    pub fn last_commit(&self) -> Result<Option<HistoryEntry>, MirrorError> {
        let entry = self
            .conn
            .query_row(
                "SELECT commit_id, timestamp FROM update_history ORDER BY datetime(timestamp) DESC, rowid DESC LIMIT 1",
                [],
                |row| {
                    Ok(HistoryEntry {
                        commit_id: row.get(0)?,
                        timestamp: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    pub fn record_commit(&self, commit_id: &str) -> Result<(), MirrorError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO update_history (commit_id, timestamp) VALUES (?1, ?2)",
            params![commit_id, now()],
        )?;
        Ok(())
    }

    pub fn count_packages(&self) -> Result<i64, MirrorError> {
        let count = self
            .conn
            .query_row("SELECT count(id) FROM crate", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn exists(&self, name: &str, version: &str) -> Result<bool, MirrorError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(id) FROM crate WHERE name = ?1 AND version = ?2",
            params![name, version],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn get_entry(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<CatalogEntry>, MirrorError> {
        let entry = self
            .conn
            .query_row(
                "SELECT name, version, checksum, yanked, downloaded, forbidden, last_update
                 FROM crate WHERE name = ?1 AND version = ?2",
                params![name, version],
                |row| {
                    Ok(CatalogEntry {
                        name: row.get(0)?,
                        version: row.get(1)?,
                        checksum: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        yanked: row.get::<_, i64>(3)? != 0,
                        downloaded: row.get::<_, i64>(4)? != 0,
                        forbidden: row.get::<_, i64>(5)? != 0,
                        last_update: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }
}

// Text timestamps keep the history ledger sortable with sqlite's datetime()
fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.f").to_string()
}
