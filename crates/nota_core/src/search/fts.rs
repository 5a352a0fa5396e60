//! Trigram FTS5 candidate selection.
//!
//! # Responsibility
//! - Build the accelerated filter over the `note_fts` index.
//! - Classify SQLite errors that mean "index unavailable" so callers can
//!   fall back to the scan path.
//!
//! # Invariants
//! - The user query is always passed as one quoted FTS5 phrase; FTS5
//!   operators in user text are never interpreted.
//! - The exact scan predicate is appended, so results never differ from
//!   [`super::scan`].

use super::scan::scan_filter;
use super::SearchFilter;
use rusqlite::types::Value;

/// Builds the accelerated filter: trigram candidates, then exact predicate.
pub fn full_text_filter(query: &str) -> SearchFilter {
    let exact = scan_filter(query);
    let mut binds = Vec::with_capacity(exact.binds.len() + 1);
    binds.push(Value::Text(escape_fts_phrase(query)));
    binds.extend(exact.binds);

    SearchFilter {
        sql: format!(
            " AND rowid IN (SELECT rowid FROM note_fts WHERE note_fts MATCH ?){}",
            exact.sql
        ),
        binds,
    }
}

/// Quotes raw text as a single FTS5 phrase.
pub fn escape_fts_phrase(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

/// Returns whether `err` means the accelerated index cannot be used.
pub fn is_index_unavailable(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            msg.contains("no such table: note_fts")
                || msg.contains("no such module")
                || msg.contains("no such tokenizer")
                || msg.contains("no such function: match")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_fts_phrase, is_index_unavailable};

    #[test]
    fn phrase_escaping_doubles_quotes() {
        assert_eq!(escape_fts_phrase("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_fts_phrase("a OR b"), "\"a OR b\"");
    }

    #[test]
    fn missing_table_is_classified_as_unavailable() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn
            .prepare("SELECT rowid FROM note_fts WHERE note_fts MATCH 'x'")
            .unwrap_err();
        assert!(is_index_unavailable(&err));

        let syntax = conn.prepare("SELEC 1").unwrap_err();
        assert!(!is_index_unavailable(&syntax));
    }
}
