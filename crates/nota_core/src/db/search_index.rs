//! Optional trigram FTS5 index over note title/content.
//!
//! # Responsibility
//! - Create the `note_fts` external-content index and its sync triggers.
//! - Backfill the index from existing rows on first creation.
//!
//! # Invariants
//! - Index creation is all-or-nothing (single transaction).
//! - Failure to create the index is logged and reported as
//!   [`SearchIndexStatus::Unavailable`], never as an error.

use super::{table_exists, DbResult};
use log::{info, warn};
use rusqlite::Connection;

/// Name of the accelerated search virtual table.
pub const SEARCH_INDEX_TABLE: &str = "note_fts";

const CREATE_INDEX_SQL: &str = "
CREATE VIRTUAL TABLE note_fts USING fts5(
    title,
    content,
    content = 'note',
    content_rowid = 'rowid',
    tokenize = 'trigram'
);

CREATE TRIGGER IF NOT EXISTS note_fts_ai AFTER INSERT ON note BEGIN
    INSERT INTO note_fts (rowid, title, content)
    VALUES (new.rowid, new.title, new.content);
END;

CREATE TRIGGER IF NOT EXISTS note_fts_ad AFTER DELETE ON note BEGIN
    INSERT INTO note_fts (note_fts, rowid, title, content)
    VALUES ('delete', old.rowid, old.title, old.content);
END;

CREATE TRIGGER IF NOT EXISTS note_fts_au AFTER UPDATE OF title, content ON note BEGIN
    INSERT INTO note_fts (note_fts, rowid, title, content)
    VALUES ('delete', old.rowid, old.title, old.content);
    INSERT INTO note_fts (rowid, title, content)
    VALUES (new.rowid, new.title, new.content);
END;

INSERT INTO note_fts (note_fts) VALUES ('rebuild');
";

/// Outcome of search-index provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIndexStatus {
    /// Index already existed.
    Present,
    /// Index was created (and backfilled) by this call.
    Created,
    /// SQLite build lacks FTS5/trigram support; substring scan only.
    Unavailable,
}

impl SearchIndexStatus {
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Ensures the trigram index exists when the SQLite build supports it.
///
/// # Errors
/// - Returns an error only when the schema catalog itself cannot be read.
pub fn ensure_search_index(conn: &mut Connection) -> DbResult<SearchIndexStatus> {
    if table_exists(conn, SEARCH_INDEX_TABLE)? {
        return Ok(SearchIndexStatus::Present);
    }

    match create_index(conn) {
        Ok(()) => {
            info!("event=search_index module=db status=ok action=created");
            Ok(SearchIndexStatus::Created)
        }
        Err(err) => {
            warn!(
                "event=search_index module=db status=skipped fallback=scan error={}",
                err
            );
            Ok(SearchIndexStatus::Unavailable)
        }
    }
}

fn create_index(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_INDEX_SQL)?;
    tx.commit()
}
