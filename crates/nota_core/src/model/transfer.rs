//! JSON documents used by note import/export.
//!
//! # Responsibility
//! - Define the on-disk shapes of single-note files and note bundles.
//! - Convert between documents and [`Note`] records.
//!
//! # Invariants
//! - Timestamps are RFC 3339, second precision, UTC `Z` suffix.
//! - `deleted_at` is omitted from output when unset.
//! - A bundle's `count` equals the length of `notes` on export.

use crate::model::note::{now_millis, Metadata, Note, NOTE_SCHEMA_VERSION};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Only document/bundle version understood by this build.
pub const TRANSFER_FORMAT_VERSION: i64 = NOTE_SCHEMA_VERSION;

/// Single-note JSON document.
///
/// Every field is optional on input so that version checks can report
/// `UnsupportedVersion` instead of a parse error for foreign documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    pub metadata: Option<Metadata>,
}

impl From<&Note> for NoteDocument {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            version: note.version,
            created_at: format_timestamp(&note.created_at),
            updated_at: format_timestamp(&note.updated_at),
            deleted_at: note.deleted_at.as_ref().map(format_timestamp),
            metadata: Some(note.metadata.clone()),
        }
    }
}

impl NoteDocument {
    /// Converts this document into a note record.
    ///
    /// Missing or unparseable `created_at`/`updated_at` fall back to now;
    /// an unparseable `deleted_at` is dropped.
    pub fn into_note(self) -> Note {
        let now = now_millis();
        Note {
            id: self.id,
            title: self.title,
            content: self.content,
            version: self.version,
            created_at: parse_timestamp(&self.created_at).unwrap_or(now),
            updated_at: parse_timestamp(&self.updated_at).unwrap_or(now),
            deleted_at: self.deleted_at.as_deref().and_then(parse_timestamp),
            metadata: self.metadata.unwrap_or_default(),
        }
    }
}

/// Multi-note JSON bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteBundle {
    pub version: i64,
    pub count: usize,
    pub notes: Vec<NoteDocument>,
}

impl NoteBundle {
    /// Builds a bundle at the current format version.
    pub fn from_notes(notes: &[Note]) -> Self {
        let notes = notes.iter().map(NoteDocument::from).collect::<Vec<_>>();
        Self {
            version: TRANSFER_FORMAT_VERSION,
            count: notes.len(),
            notes,
        }
    }
}

/// Formats a timestamp as RFC 3339 with second precision (`...Z`).
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses an RFC 3339 timestamp with any offset into UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, parse_timestamp, NoteBundle, NoteDocument};
    use crate::model::note::Note;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn document_omits_unset_deleted_at_and_formats_seconds() {
        let mut note = Note::draft("title", "body");
        note.id = "note_abc".to_string();
        note.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        note.updated_at = note.created_at;

        let value = serde_json::to_value(NoteDocument::from(&note)).unwrap();
        assert_eq!(value["created_at"], json!("2024-03-01T08:30:00Z"));
        assert!(value.get("deleted_at").is_none());
        assert_eq!(value["metadata"], json!({}));
    }

    #[test]
    fn bad_timestamps_fall_back_instead_of_failing() {
        let document = NoteDocument {
            id: "note_x".to_string(),
            title: "t".to_string(),
            version: 1,
            created_at: "yesterday".to_string(),
            deleted_at: Some("not a date".to_string()),
            ..NoteDocument::default()
        };
        let note = document.into_note();
        assert!(note.deleted_at.is_none());
        assert!(note.metadata.is_empty());
    }

    #[test]
    fn parse_accepts_offsets_and_normalizes_to_utc() {
        let parsed = parse_timestamp("2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(format_timestamp(&parsed), "2024-03-01T08:30:00Z");
        assert!(parse_timestamp("   ").is_none());
    }

    #[test]
    fn bundle_count_matches_notes() {
        let notes = vec![Note::draft("a", ""), Note::draft("b", "")];
        let bundle = NoteBundle::from_notes(&notes);
        assert_eq!(bundle.version, 1);
        assert_eq!(bundle.count, 2);
        assert_eq!(bundle.notes.len(), 2);
    }
}
