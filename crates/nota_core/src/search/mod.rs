//! Note search strategies.
//!
//! # Responsibility
//! - Choose between the trigram-accelerated path and the substring scan.
//! - Build SQL filter fragments with identical match semantics per path.
//!
//! # Invariants
//! - Both paths filter with the same escaped `LIKE` predicate; the
//!   accelerated path only narrows candidates first.
//! - An empty query never reaches this module (callers list instead).

pub mod fts;
pub mod scan;

use crate::db::search_index::SEARCH_INDEX_TABLE;
use crate::db::{table_exists, DbResult};
use rusqlite::types::Value;
use rusqlite::Connection;

/// Trigram tokens need at least this many characters to match anything.
pub const MIN_FULL_TEXT_QUERY_CHARS: usize = 3;

/// Search execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Pre-select candidates through the `note_fts` trigram index.
    FullText,
    /// Evaluate the substring predicate against every active row.
    Scan,
}

impl SearchMode {
    /// Returns the mode that can actually serve `query`.
    ///
    /// Short queries cannot be answered by trigram lookup and always scan.
    pub fn effective_for(self, query: &str) -> SearchMode {
        match self {
            Self::FullText if query.chars().count() >= MIN_FULL_TEXT_QUERY_CHARS => {
                Self::FullText
            }
            _ => Self::Scan,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullText => "full_text",
            Self::Scan => "scan",
        }
    }
}

/// Best mode the connection supports: `FullText` when `note_fts` exists.
pub fn available_search_mode(conn: &Connection) -> DbResult<SearchMode> {
    if table_exists(conn, SEARCH_INDEX_TABLE)? {
        Ok(SearchMode::FullText)
    } else {
        Ok(SearchMode::Scan)
    }
}

/// SQL `WHERE` fragment (starting with ` AND`) plus its positional binds.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    pub sql: String,
    pub binds: Vec<Value>,
}

/// Builds the filter for a non-empty query under the given mode.
pub fn build_filter(mode: SearchMode, query: &str) -> SearchFilter {
    match mode.effective_for(query) {
        SearchMode::FullText => fts::full_text_filter(query),
        SearchMode::Scan => scan::scan_filter(query),
    }
}

#[cfg(test)]
mod tests {
    use super::{available_search_mode, build_filter, SearchMode};
    use rusqlite::Connection;

    #[test]
    fn short_queries_always_scan() {
        assert_eq!(SearchMode::FullText.effective_for("ab"), SearchMode::Scan);
        assert_eq!(
            SearchMode::FullText.effective_for("abc"),
            SearchMode::FullText
        );
        assert_eq!(SearchMode::Scan.effective_for("abcdef"), SearchMode::Scan);
    }

    #[test]
    fn full_text_filter_reuses_scan_predicate() {
        let full = build_filter(SearchMode::FullText, "rust");
        let scan = build_filter(SearchMode::Scan, "rust");
        assert!(full.sql.contains("note_fts MATCH ?"));
        assert!(full.sql.ends_with(scan.sql.as_str()));
        assert_eq!(full.binds.len(), scan.binds.len() + 1);
    }

    #[test]
    fn bare_database_only_supports_scan() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(available_search_mode(&conn).unwrap(), SearchMode::Scan);

        conn.execute_batch("CREATE TABLE note_fts (title TEXT);")
            .unwrap();
        assert_eq!(
            available_search_mode(&conn).unwrap(),
            SearchMode::FullText
        );
    }
}
