//! Preference use-case service.
//!
//! # Invariants
//! - `language()` never fails on a missing or unknown stored value; it
//!   falls back to [`Language::English`].

use crate::model::config::{ConfigEntry, Language, CONFIG_KEY_LANGUAGE};
use crate::repo::config_repo::ConfigRepository;
use crate::repo::note_repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for preference use-cases.
#[derive(Debug)]
pub enum PreferenceError {
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl Display for PreferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PreferenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for PreferenceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Preference service facade over a config repository.
pub struct PreferenceService<R: ConfigRepository> {
    repo: R,
}

impl<R: ConfigRepository> PreferenceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists the UI language choice.
    pub fn save_language(&self, language: Language) -> PreferenceResult<()> {
        self.repo
            .save(&ConfigEntry::new(CONFIG_KEY_LANGUAGE, language.code()))?;
        info!(
            "event=language_save module=preference_service status=ok language={}",
            language.code()
        );
        Ok(())
    }

    /// Returns the stored UI language, defaulting to English.
    pub fn language(&self) -> PreferenceResult<Language> {
        let entry = match self.repo.find_by_name(CONFIG_KEY_LANGUAGE) {
            Ok(entry) => entry,
            Err(RepoError::NotFound(_)) => return Ok(Language::default()),
            Err(err) => return Err(err.into()),
        };

        match Language::from_code(&entry.value) {
            Some(language) => Ok(language),
            None => {
                warn!(
                    "event=language_load module=preference_service status=fallback error_code=unknown_language"
                );
                Ok(Language::default())
            }
        }
    }
}
