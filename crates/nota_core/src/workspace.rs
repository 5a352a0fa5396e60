//! Opened note workspace: one database connection plus service accessors.
//!
//! # Responsibility
//! - Turn a [`CoreConfig`] into a ready, migrated connection.
//! - Hand out services that share that connection.
//!
//! # Invariants
//! - The database parent directory exists after a successful `open`.
//! - Services are cheap borrowing views; they never own the connection.

use crate::config::{ConfigError, CoreConfig};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::repo::config_repo::SqliteConfigRepository;
use crate::repo::note_repo::SqliteNoteRepository;
use crate::search::{available_search_mode, SearchMode};
use crate::service::note_service::NoteService;
use crate::service::preference_service::PreferenceService;
use crate::service::transfer_service::TransferService;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Error raised while opening a workspace.
#[derive(Debug)]
pub enum WorkspaceError {
    Config(ConfigError),
    Db(DbError),
    /// Database directory could not be created.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(
                f,
                "failed to create database directory `{}`: {source}",
                path.display()
            ),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for WorkspaceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for WorkspaceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Migrated database connection with note/transfer/preference services.
pub struct Workspace {
    conn: Connection,
    search_mode: SearchMode,
    db_path: Option<PathBuf>,
}

impl Workspace {
    /// Opens (creating if needed) the database described by `config`.
    pub fn open(config: &CoreConfig) -> WorkspaceResult<Self> {
        let db_path = config.resolve_db_path()?;
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| WorkspaceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = open_db(&db_path)?;
        let workspace = Self::from_connection(conn, config.full_text_search, Some(db_path))?;
        info!(
            "event=workspace_open module=workspace status=ok search_mode={}",
            workspace.search_mode.as_str()
        );
        Ok(workspace)
    }

    /// Opens a throwaway in-memory workspace.
    pub fn open_in_memory(full_text_search: bool) -> WorkspaceResult<Self> {
        Self::from_connection(open_db_in_memory()?, full_text_search, None)
    }

    fn from_connection(
        conn: Connection,
        full_text_search: bool,
        db_path: Option<PathBuf>,
    ) -> WorkspaceResult<Self> {
        let search_mode = if full_text_search {
            available_search_mode(&conn)?
        } else {
            SearchMode::Scan
        };
        Ok(Self {
            conn,
            search_mode,
            db_path,
        })
    }

    /// Resolved database file, `None` for in-memory workspaces.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn notes(&self) -> NoteService<SqliteNoteRepository<'_>> {
        NoteService::new(self.note_repository())
    }

    pub fn transfer(&self) -> TransferService<SqliteNoteRepository<'_>> {
        TransferService::new(self.note_repository())
    }

    pub fn preferences(&self) -> PreferenceService<SqliteConfigRepository<'_>> {
        PreferenceService::new(SqliteConfigRepository::new(&self.conn))
    }

    fn note_repository(&self) -> SqliteNoteRepository<'_> {
        SqliteNoteRepository::with_search_mode(&self.conn, self.search_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::Workspace;
    use crate::config::CoreConfig;
    use crate::search::{available_search_mode, SearchMode};

    #[test]
    fn open_creates_database_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested/data/nota.sqlite");
        let config = CoreConfig {
            db_path: db_path.to_string_lossy().into_owned(),
            ..CoreConfig::default()
        };

        let workspace = Workspace::open(&config).unwrap();
        assert_eq!(workspace.db_path(), Some(db_path.as_path()));
        assert!(db_path.exists());
    }

    #[test]
    fn disabling_full_text_search_selects_scan() {
        let workspace = Workspace::open_in_memory(false).unwrap();
        assert_eq!(workspace.search_mode(), SearchMode::Scan);
    }

    #[test]
    fn enabled_full_text_search_follows_index_presence() {
        let workspace = Workspace::open_in_memory(true).unwrap();
        let available = available_search_mode(workspace.connection()).unwrap();
        assert_eq!(workspace.search_mode(), available);
    }
}
