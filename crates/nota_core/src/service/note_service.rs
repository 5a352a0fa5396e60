//! Note use-case service.
//!
//! # Responsibility
//! - Enforce note business rules before delegating to the repository.
//! - Provide create/update/delete/get/list/search/last-modified APIs.
//!
//! # Invariants
//! - Titles must be non-empty on create and update; no write happens
//!   otherwise.
//! - Update and delete require an existing row (active or deleted) and
//!   check it before writing.
//! - Note list is always sorted by `updated_at DESC, id ASC`.

use crate::model::note::Note;
use crate::repo::note_repo::{NoteRepository, Page, RepoError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title is empty.
    EmptyTitle,
    /// Id is empty or no row exists for it.
    NoteNotFound(String),
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title cannot be empty"),
            Self::NoteNotFound(id) if id.is_empty() => write!(f, "note not found: empty id"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Storage(other),
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Persists a new note and returns it with id and timestamps assigned.
    pub fn create_note(&self, note: &Note) -> NoteServiceResult<Note> {
        if note.title.is_empty() {
            warn!("event=note_create module=note_service status=error error_code=empty_title");
            return Err(NoteServiceError::EmptyTitle);
        }

        match self.repo.save(note) {
            Ok(created) => {
                info!(
                    "event=note_create module=note_service status=ok note_id={}",
                    created.id
                );
                Ok(created)
            }
            Err(err) => {
                error!(
                    "event=note_create module=note_service status=error error={}",
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Replaces title/content of an existing note.
    ///
    /// Fails with `NoteNotFound` before any write when the id is unknown.
    pub fn update_note(&self, note: &Note) -> NoteServiceResult<Note> {
        if note.title.is_empty() {
            warn!(
                "event=note_update module=note_service status=error error_code=empty_title note_id={}",
                note.id
            );
            return Err(NoteServiceError::EmptyTitle);
        }
        self.require_existing(&note.id, "note_update")?;

        match self.repo.save(note) {
            Ok(updated) => {
                info!(
                    "event=note_update module=note_service status=ok note_id={}",
                    updated.id
                );
                Ok(updated)
            }
            Err(err) => {
                error!(
                    "event=note_update module=note_service status=error note_id={} error={}",
                    note.id, err
                );
                Err(err.into())
            }
        }
    }

    /// Soft-deletes one note.
    pub fn delete_note(&self, id: &str) -> NoteServiceResult<()> {
        self.require_existing(id, "note_delete")?;
        self.repo.delete(id)?;
        info!("event=note_delete module=note_service status=ok note_id={id}");
        Ok(())
    }

    /// Gets one note by id, including soft-deleted notes.
    pub fn get_note(&self, id: &str) -> NoteServiceResult<Note> {
        debug!("event=note_get module=note_service status=start note_id={id}");
        self.require_existing(id, "note_get")
    }

    /// Lists all active notes, newest first.
    pub fn list_notes(&self) -> NoteServiceResult<Vec<Note>> {
        let notes = self.repo.find_all_sorted()?;
        debug!(
            "event=note_list module=note_service status=ok count={}",
            notes.len()
        );
        Ok(notes)
    }

    /// Lists one page of active notes, newest first.
    pub fn list_notes_page(&self, page: Page) -> NoteServiceResult<Vec<Note>> {
        Ok(self.repo.find_all_sorted_paginated(page)?)
    }

    /// Searches active notes by title/content substring.
    pub fn search_notes(&self, query: &str) -> NoteServiceResult<Vec<Note>> {
        let notes = self.repo.search(query)?;
        debug!(
            "event=note_search module=note_service status=ok query_chars={} hits={}",
            query.chars().count(),
            notes.len()
        );
        Ok(notes)
    }

    /// Paginated variant of [`NoteService::search_notes`].
    pub fn search_notes_page(&self, query: &str, page: Page) -> NoteServiceResult<Vec<Note>> {
        Ok(self.repo.search_paginated(query, page)?)
    }

    /// Returns the most recently updated active note.
    pub fn get_last_modified_note(&self) -> NoteServiceResult<Note> {
        let notes = self.list_notes()?;
        match notes.into_iter().next() {
            Some(note) => Ok(note),
            None => {
                warn!("event=note_last_modified module=note_service status=error error_code=no_notes");
                Err(NoteServiceError::NoteNotFound(String::new()))
            }
        }
    }

    fn require_existing(&self, id: &str, event: &'static str) -> NoteServiceResult<Note> {
        if id.is_empty() {
            warn!("event={event} module=note_service status=error error_code=empty_id");
            return Err(NoteServiceError::NoteNotFound(String::new()));
        }

        match self.repo.find_by_id(id) {
            Ok(note) => Ok(note),
            Err(RepoError::NotFound(_)) => {
                warn!("event={event} module=note_service status=error error_code=not_found note_id={id}");
                Err(NoteServiceError::NoteNotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}
