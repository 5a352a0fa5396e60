//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record persisted by the note store.
//! - Own id generation and timestamp normalization helpers.
//!
//! # Invariants
//! - An empty `id` means the note has never been persisted.
//! - `deleted_at` is the source of truth for tombstone state.
//! - Timestamps carry millisecond precision, matching storage.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Namespace prefix of generated note ids.
pub const NOTE_ID_PREFIX: &str = "note";

/// Fixed schema-version marker carried by every note.
///
/// Not a revision counter: it is never incremented on update.
pub const NOTE_SCHEMA_VERSION: i64 = 1;

/// Open string-keyed metadata map, persisted as JSON text.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Canonical note record.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Opaque unique id; empty until first persistence.
    pub id: String,
    /// Display title. Non-empty at the service boundary.
    pub title: String,
    /// Free-form body text.
    pub content: String,
    /// Schema-version marker, see [`NOTE_SCHEMA_VERSION`].
    pub version: i64,
    /// Set once on first persistence.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
    /// Soft delete tombstone.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Arbitrary caller metadata.
    pub metadata: Metadata,
}

impl Note {
    /// Creates an unpersisted note with empty id and empty metadata.
    ///
    /// Timestamps are placeholders; the store overwrites them on insert.
    pub fn draft(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: String::new(),
            title: title.into(),
            content: content.into(),
            version: NOTE_SCHEMA_VERSION,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            metadata: Metadata::new(),
        }
    }

    /// Returns whether this note has been assigned a storage id.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Returns whether this note is visible to list/search/lookup queries.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Generates a fresh namespaced note id, e.g. `note_3f2a...`.
pub fn generate_note_id() -> String {
    format!("{NOTE_ID_PREFIX}_{}", Uuid::new_v4().simple())
}

/// Current UTC time truncated to millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    from_epoch_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Converts an epoch-millisecond storage value to a UTC timestamp.
///
/// Returns `None` when the value is out of chrono's representable range.
pub fn from_epoch_millis(value: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
}

/// Converts a UTC timestamp to its epoch-millisecond storage value.
pub fn to_epoch_millis(value: &DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}
