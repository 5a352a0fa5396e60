//! Preference (key/value) repository over the `config` table.
//!
//! # Invariants
//! - `name` is the primary key; `save` replaces an existing value.
//! - `find_all` is ordered by name.

use crate::model::config::ConfigEntry;
use crate::repo::note_repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for preference rows.
pub trait ConfigRepository {
    fn save(&self, entry: &ConfigEntry) -> RepoResult<()>;
    fn find_by_name(&self, name: &str) -> RepoResult<ConfigEntry>;
    fn find_all(&self) -> RepoResult<Vec<ConfigEntry>>;
    fn delete(&self, name: &str) -> RepoResult<()>;
}

/// SQLite-backed preference repository.
pub struct SqliteConfigRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConfigRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ConfigRepository for SqliteConfigRepository<'_> {
    fn save(&self, entry: &ConfigEntry) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO config (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value;",
            params![entry.name.as_str(), entry.value.as_str()],
        )?;
        debug!(
            "event=config_save module=repo status=ok name={}",
            entry.name
        );
        Ok(())
    }

    fn find_by_name(&self, name: &str) -> RepoResult<ConfigEntry> {
        self.conn
            .query_row(
                "SELECT name, value FROM config WHERE name = ?1;",
                [name],
                |row| {
                    Ok(ConfigEntry {
                        name: row.get(0)?,
                        value: row.get(1)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| RepoError::NotFound(name.to_string()))
    }

    fn find_all(&self) -> RepoResult<Vec<ConfigEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM config ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(ConfigEntry {
                name: row.get(0)?,
                value: row.get(1)?,
            });
        }
        Ok(entries)
    }

    fn delete(&self, name: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM config WHERE name = ?1;", [name])?;
        if changed == 0 {
            return Err(RepoError::NotFound(name.to_string()));
        }
        Ok(())
    }
}
