//! Note persistence core for Nota.
//! This crate is the single source of truth for note invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod workspace;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::config::Language;
pub use model::note::Note;
pub use repo::note_repo::{NoteRepository, Page, RepoError, RepoResult, SqliteNoteRepository};
pub use search::SearchMode;
pub use service::note_service::{NoteService, NoteServiceError};
pub use service::preference_service::{PreferenceError, PreferenceService};
pub use service::transfer_service::{BatchFailure, BatchReport, TransferError, TransferService};
pub use workspace::{Workspace, WorkspaceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
