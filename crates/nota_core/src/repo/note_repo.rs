//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable CRUD over the `note` table.
//! - Own soft-delete, ordering and pagination semantics.
//! - Run searches through the capability-checked strategy in [`crate::search`].
//!
//! # Invariants
//! - List/search/title/last-modified queries only see `deleted_at IS NULL`.
//! - Listing order is always `updated_at DESC, id ASC`.
//! - `save` on an existing id touches only `title`, `content`, `updated_at`.
//! - `updated_at` strictly increases per note across mutations.

use crate::db::DbError;
use crate::model::note::{
    from_epoch_millis, generate_note_id, now_millis, to_epoch_millis, Metadata, Note,
    NOTE_SCHEMA_VERSION,
};
use crate::search::fts::is_index_unavailable;
use crate::search::{available_search_mode, build_filter, SearchFilter, SearchMode};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    version,
    created_at,
    updated_at,
    deleted_at,
    metadata
FROM note";

const ACTIVE_ORDER_SQL: &str = " ORDER BY updated_at DESC, id ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Storage-level failure (I/O, constraint, connection).
    Db(DbError),
    /// No row matched the given id/title/name.
    NotFound(String),
    /// Persisted row or caller input cannot be represented.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Offset/limit window applied in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }
}

/// Repository interface for note persistence.
pub trait NoteRepository {
    /// Inserts a new note (empty id) or updates title/content of an existing one.
    ///
    /// Returns the persisted state.
    fn save(&self, note: &Note) -> RepoResult<Note>;
    /// Writes every field verbatim, inserting or replacing by id.
    fn upsert(&self, note: &Note) -> RepoResult<()>;
    /// Replaces title, content and metadata of an existing note.
    ///
    /// Bumps `updated_at` like `save`; `created_at`, `version` and the
    /// tombstone are left as stored. Returns the persisted state.
    fn overwrite(&self, note: &Note) -> RepoResult<Note>;
    /// Gets one note by id, including soft-deleted rows.
    fn find_by_id(&self, id: &str) -> RepoResult<Note>;
    /// Lists all active notes, newest first.
    fn find_all_sorted(&self) -> RepoResult<Vec<Note>>;
    /// Lists one page of active notes, newest first.
    fn find_all_sorted_paginated(&self, page: Page) -> RepoResult<Vec<Note>>;
    /// Substring search over title/content; empty query lists all.
    fn search(&self, query: &str) -> RepoResult<Vec<Note>>;
    /// Paginated variant of [`NoteRepository::search`].
    fn search_paginated(&self, query: &str, page: Page) -> RepoResult<Vec<Note>>;
    /// Soft-deletes one note.
    fn delete(&self, id: &str) -> RepoResult<()>;
    /// First active note with exactly this title.
    fn find_by_title(&self, title: &str) -> RepoResult<Note>;
    /// Active note with the greatest `updated_at`.
    fn find_last_modified(&self) -> RepoResult<Note>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
    search_mode: SearchMode,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository, enabling full-text search when the index exists.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::with_search_mode(conn, available_search_mode(conn)?))
    }

    /// Constructs a repository with an explicit search strategy.
    ///
    /// A forced `FullText` mode still falls back to scanning when the index
    /// turns out to be unavailable at query time.
    pub fn with_search_mode(conn: &'conn Connection, search_mode: SearchMode) -> Self {
        Self { conn, search_mode }
    }

    /// Returns the configured search strategy.
    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    fn insert_new(&self, note: &Note) -> RepoResult<Note> {
        let now = now_millis();
        let persisted = Note {
            id: generate_note_id(),
            version: NOTE_SCHEMA_VERSION,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            ..note.clone()
        };

        self.conn.execute(
            "INSERT INTO note (
                id,
                title,
                content,
                version,
                created_at,
                updated_at,
                deleted_at,
                metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7);",
            params![
                persisted.id.as_str(),
                persisted.title.as_str(),
                persisted.content.as_str(),
                persisted.version,
                to_epoch_millis(&persisted.created_at),
                to_epoch_millis(&persisted.updated_at),
                encode_metadata(&persisted.metadata)?,
            ],
        )?;

        debug!(
            "event=note_insert module=repo status=ok note_id={}",
            persisted.id
        );
        Ok(persisted)
    }

    fn update_existing(&self, note: &Note) -> RepoResult<Note> {
        let changed = self.conn.execute(
            "UPDATE note
             SET
                title = ?2,
                content = ?3,
                updated_at = MAX(?4, updated_at + 1)
             WHERE id = ?1;",
            params![
                note.id.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                to_epoch_millis(&now_millis()),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id.clone()));
        }

        self.find_by_id(&note.id)
    }

    fn query_active(
        &self,
        filter: Option<&SearchFilter>,
        page: Option<Page>,
    ) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE deleted_at IS NULL");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(filter) = filter {
            sql.push_str(&filter.sql);
            bind_values.extend(filter.binds.iter().cloned());
        }

        sql.push_str(ACTIVE_ORDER_SQL);

        if let Some(page) = page {
            sql.push_str(" LIMIT ? OFFSET ?");
            bind_values.push(Value::Integer(i64::from(page.limit)));
            bind_values.push(Value::Integer(i64::from(page.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }

        Ok(notes)
    }

    fn search_page(&self, query: &str, page: Option<Page>) -> RepoResult<Vec<Note>> {
        if query.is_empty() {
            return self.query_active(None, page);
        }

        let mode = self.search_mode.effective_for(query);
        if mode == SearchMode::FullText {
            let filter = build_filter(mode, query);
            match self.query_active(Some(&filter), page) {
                Ok(notes) => {
                    debug!(
                        "event=note_search module=repo status=ok mode={} hits={}",
                        mode.as_str(),
                        notes.len()
                    );
                    return Ok(notes);
                }
                Err(RepoError::Db(DbError::Sqlite(err))) if is_index_unavailable(&err) => {
                    warn!(
                        "event=note_search module=repo status=fallback mode=scan error={}",
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }

        let filter = build_filter(SearchMode::Scan, query);
        let notes = self.query_active(Some(&filter), page)?;
        debug!(
            "event=note_search module=repo status=ok mode=scan hits={}",
            notes.len()
        );
        Ok(notes)
    }

    fn find_first_active(&self, clause: &str, bind_values: Vec<Value>) -> RepoResult<Option<Note>> {
        let sql = format!(
            "{NOTE_SELECT_SQL} WHERE deleted_at IS NULL{clause}{ACTIVE_ORDER_SQL} LIMIT 1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn save(&self, note: &Note) -> RepoResult<Note> {
        if note.is_persisted() {
            self.update_existing(note)
        } else {
            self.insert_new(note)
        }
    }

    fn upsert(&self, note: &Note) -> RepoResult<()> {
        if !note.is_persisted() {
            return Err(RepoError::InvalidData(
                "upsert requires a non-empty note id".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO note (
                id,
                title,
                content,
                version,
                created_at,
                updated_at,
                deleted_at,
                metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                version = excluded.version,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                deleted_at = excluded.deleted_at,
                metadata = excluded.metadata;",
            params![
                note.id.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                note.version,
                to_epoch_millis(&note.created_at),
                to_epoch_millis(&note.updated_at),
                note.deleted_at.as_ref().map(to_epoch_millis),
                encode_metadata(&note.metadata)?,
            ],
        )?;

        debug!(
            "event=note_upsert module=repo status=ok note_id={}",
            note.id
        );
        Ok(())
    }

    fn overwrite(&self, note: &Note) -> RepoResult<Note> {
        let changed = self.conn.execute(
            "UPDATE note
             SET
                title = ?2,
                content = ?3,
                metadata = ?4,
                updated_at = MAX(?5, updated_at + 1)
             WHERE id = ?1;",
            params![
                note.id.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                encode_metadata(&note.metadata)?,
                to_epoch_millis(&now_millis()),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id.clone()));
        }

        debug!(
            "event=note_overwrite module=repo status=ok note_id={}",
            note.id
        );
        self.find_by_id(&note.id)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Note> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_note_row(row);
        }

        Err(RepoError::NotFound(id.to_string()))
    }

    fn find_all_sorted(&self) -> RepoResult<Vec<Note>> {
        self.query_active(None, None)
    }

    fn find_all_sorted_paginated(&self, page: Page) -> RepoResult<Vec<Note>> {
        self.query_active(None, Some(page))
    }

    fn search(&self, query: &str) -> RepoResult<Vec<Note>> {
        self.search_page(query, None)
    }

    fn search_paginated(&self, query: &str, page: Page) -> RepoResult<Vec<Note>> {
        self.search_page(query, Some(page))
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        let now = to_epoch_millis(&now_millis());
        let changed = self.conn.execute(
            "UPDATE note
             SET
                deleted_at = COALESCE(deleted_at, ?2),
                updated_at = MAX(?2, updated_at + 1)
             WHERE id = ?1;",
            params![id, now],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn find_by_title(&self, title: &str) -> RepoResult<Note> {
        self.find_first_active(" AND title = ?", vec![Value::Text(title.to_string())])?
            .ok_or_else(|| RepoError::NotFound(title.to_string()))
    }

    fn find_last_modified(&self) -> RepoResult<Note> {
        self.find_first_active("", Vec::new())?
            .ok_or_else(|| RepoError::NotFound("last modified note".to_string()))
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id: String = row.get("id")?;

    let created_at = parse_millis(row.get("created_at")?, &id, "created_at")?;
    let updated_at = parse_millis(row.get("updated_at")?, &id, "updated_at")?;
    let deleted_at = match row.get::<_, Option<i64>>("deleted_at")? {
        Some(value) => Some(parse_millis(value, &id, "deleted_at")?),
        None => None,
    };

    let metadata = match row.get::<_, Option<String>>("metadata")? {
        Some(text) if !text.trim().is_empty() => decode_metadata(&text, &id)?,
        _ => Metadata::new(),
    };

    Ok(Note {
        title: row.get("title")?,
        content: row.get("content")?,
        version: row.get("version")?,
        created_at,
        updated_at,
        deleted_at,
        metadata,
        id,
    })
}

fn parse_millis(
    value: i64,
    id: &str,
    column: &'static str,
) -> RepoResult<chrono::DateTime<chrono::Utc>> {
    from_epoch_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{value}` in note.{column} for `{id}`"
        ))
    })
}

fn encode_metadata(metadata: &Metadata) -> RepoResult<String> {
    serde_json::to_string(metadata)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode metadata: {err}")))
}

fn decode_metadata(text: &str, id: &str) -> RepoResult<Metadata> {
    serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!("invalid metadata json in note.metadata for `{id}`: {err}"))
    })
}
