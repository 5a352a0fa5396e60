//! Note import/export use-case service.
//!
//! # Responsibility
//! - Export notes as single-note JSON files, per-note directory batches
//!   or one bundle file.
//! - Import those files back, resolving id collisions through a
//!   caller-supplied predicate.
//!
//! # Invariants
//! - Documents with a version other than 1 are rejected before any write.
//! - Batch operations are best-effort: per-item failures are logged and
//!   reported, and the call fails only when nothing succeeded.
//! - Importing a new id preserves the document's id and timestamps.
//! - Overwriting an existing id replaces title, content and metadata only;
//!   the stored tombstone and `created_at` stay, `updated_at` moves forward.

use crate::model::note::{now_millis, Note};
use crate::model::transfer::{NoteBundle, NoteDocument, TRANSFER_FORMAT_VERSION};
use crate::repo::note_repo::{NoteRepository, RepoError};
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

const EXPORT_FILE_SUFFIX: &str = "nota_exported";
const EXPORT_ID_PREFIX_CHARS: usize = 8;
const EXPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static UNSAFE_FILENAME_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("valid filename regex"));

/// Service error for import/export use-cases.
#[derive(Debug)]
pub enum TransferError {
    /// Required file or directory path is empty.
    EmptyPath,
    /// Filesystem read/write failure.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Malformed JSON on import, or encode failure on export.
    Serialization(serde_json::Error),
    /// Document or bundle version is not understood by this build.
    UnsupportedVersion(i64),
    /// Imported document has an empty title.
    EmptyTitle,
    /// Bundle envelope is inconsistent (e.g. `count` mismatch).
    InvalidBundle(String),
    /// Export was called with no notes.
    NothingToExport,
    /// Every item of a batch failed (or there were none).
    NothingTransferred { attempted: usize },
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "path cannot be empty"),
            Self::Io { path, source } => write!(f, "`{}`: {source}", path.display()),
            Self::Serialization(err) => write!(f, "invalid note json: {err}"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported note version: {version}")
            }
            Self::EmptyTitle => write!(f, "imported note has an empty title"),
            Self::InvalidBundle(details) => write!(f, "invalid note bundle: {details}"),
            Self::NothingToExport => write!(f, "no notes to export"),
            Self::NothingTransferred { attempted } => {
                write!(f, "no notes transferred ({attempted} attempted)")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialization(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TransferError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

/// One skipped item of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// File path or note id that failed.
    pub item: String,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Outcome of a best-effort batch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failures: Vec<BatchFailure>,
}

impl<T> BatchReport<T> {
    fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn record_failure(&mut self, item: impl Into<String>, err: &TransferError) {
        self.failures.push(BatchFailure {
            item: item.into(),
            reason: err.to_string(),
        });
    }

    /// Number of items attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    fn into_result(self) -> TransferResult<Self> {
        if self.succeeded.is_empty() {
            return Err(TransferError::NothingTransferred {
                attempted: self.attempted(),
            });
        }
        Ok(self)
    }
}

/// Import/export service facade over repository implementations.
pub struct TransferService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> TransferService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Writes one note as a pretty-printed JSON document.
    ///
    /// An empty `path` becomes `<UTC now>_nota_exported.json`; `.json` is
    /// appended when the extension is missing. Returns the written path.
    pub fn export_note(&self, note: &Note, path: impl AsRef<Path>) -> TransferResult<PathBuf> {
        let path = export_target(path.as_ref());
        write_json(&path, &NoteDocument::from(note))?;
        info!(
            "event=note_export module=transfer status=ok note_id={} path={}",
            note.id,
            path.display()
        );
        Ok(path)
    }

    /// Writes one file per note into `dir`, creating it when absent.
    ///
    /// Per-note failures are logged and reported; the call fails only when
    /// every note failed.
    pub fn export_notes(
        &self,
        notes: &[Note],
        dir: impl AsRef<Path>,
    ) -> TransferResult<BatchReport<PathBuf>> {
        let dir = dir.as_ref();
        if notes.is_empty() {
            return Err(TransferError::NothingToExport);
        }
        if dir.as_os_str().is_empty() {
            return Err(TransferError::EmptyPath);
        }
        fs::create_dir_all(dir).map_err(|source| TransferError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut report = BatchReport::new();
        let mut used_names = HashSet::new();
        for note in notes {
            let path = dir.join(unique_batch_file_name(note, &mut used_names));
            match self.export_note(note, &path) {
                Ok(written) => report.succeeded.push(written),
                Err(err) => {
                    warn!(
                        "event=note_export module=transfer status=skipped note_id={} error={}",
                        note.id, err
                    );
                    report.record_failure(note.id.as_str(), &err);
                }
            }
        }

        info!(
            "event=notes_export module=transfer status=done exported={} attempted={} dir={}",
            report.succeeded.len(),
            report.attempted(),
            dir.display()
        );
        report.into_result()
    }

    /// Writes all notes into one bundle file (`{"version","count","notes"}`).
    pub fn export_bundle(&self, notes: &[Note], path: impl AsRef<Path>) -> TransferResult<PathBuf> {
        if notes.is_empty() {
            return Err(TransferError::NothingToExport);
        }
        let path = export_target(path.as_ref());
        write_json(&path, &NoteBundle::from_notes(notes))?;
        info!(
            "event=bundle_export module=transfer status=ok count={} path={}",
            notes.len(),
            path.display()
        );
        Ok(path)
    }

    /// Imports one single-note JSON file.
    ///
    /// When a note with the same id exists (deleted or not), `on_duplicate`
    /// receives the existing note: `true` overwrites its title, content and
    /// metadata (a deleted note stays deleted), `false` keeps it and returns
    /// it unchanged.
    pub fn import_note<F>(&self, path: impl AsRef<Path>, mut on_duplicate: F) -> TransferResult<Note>
    where
        F: FnMut(&Note) -> bool,
    {
        self.import_file(path.as_ref(), &mut on_duplicate)
    }

    /// Imports every `*.json` file directly inside `dir`, in file-name order.
    ///
    /// Sub-directories and other files are ignored. Per-file failures are
    /// logged and reported; the call fails only when nothing was imported.
    pub fn import_notes<F>(
        &self,
        dir: impl AsRef<Path>,
        mut on_duplicate: F,
    ) -> TransferResult<BatchReport<Note>>
    where
        F: FnMut(&Note) -> bool,
    {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Err(TransferError::EmptyPath);
        }

        let mut report = BatchReport::new();
        for path in json_files_in(dir)? {
            match self.import_file(&path, &mut on_duplicate) {
                Ok(note) => report.succeeded.push(note),
                Err(err) => {
                    warn!(
                        "event=note_import module=transfer status=skipped path={} error={}",
                        path.display(),
                        err
                    );
                    report.record_failure(path.display().to_string(), &err);
                }
            }
        }

        info!(
            "event=notes_import module=transfer status=done imported={} attempted={} dir={}",
            report.succeeded.len(),
            report.attempted(),
            dir.display()
        );
        report.into_result()
    }

    /// Imports every note of a bundle file with single-note rules.
    pub fn import_bundle<F>(
        &self,
        path: impl AsRef<Path>,
        mut on_duplicate: F,
    ) -> TransferResult<BatchReport<Note>>
    where
        F: FnMut(&Note) -> bool,
    {
        let path = path.as_ref();
        let bundle: NoteBundle = read_json(path)?;
        if bundle.version != TRANSFER_FORMAT_VERSION {
            warn!(
                "event=bundle_import module=transfer status=error error_code=unsupported_version version={}",
                bundle.version
            );
            return Err(TransferError::UnsupportedVersion(bundle.version));
        }
        if bundle.count != bundle.notes.len() {
            return Err(TransferError::InvalidBundle(format!(
                "count {} does not match {} notes",
                bundle.count,
                bundle.notes.len()
            )));
        }

        let mut report = BatchReport::new();
        for (index, document) in bundle.notes.into_iter().enumerate() {
            let item = if document.id.is_empty() {
                format!("#{index}")
            } else {
                document.id.clone()
            };
            match self.import_document(document, &mut on_duplicate) {
                Ok(note) => report.succeeded.push(note),
                Err(err) => {
                    warn!(
                        "event=bundle_import module=transfer status=skipped item={} error={}",
                        item, err
                    );
                    report.record_failure(item, &err);
                }
            }
        }

        info!(
            "event=bundle_import module=transfer status=done imported={} attempted={} path={}",
            report.succeeded.len(),
            report.attempted(),
            path.display()
        );
        report.into_result()
    }

    fn import_file(
        &self,
        path: &Path,
        on_duplicate: &mut dyn FnMut(&Note) -> bool,
    ) -> TransferResult<Note> {
        let document: NoteDocument = read_json(path)?;
        self.import_document(document, on_duplicate)
    }

    fn import_document(
        &self,
        document: NoteDocument,
        on_duplicate: &mut dyn FnMut(&Note) -> bool,
    ) -> TransferResult<Note> {
        if document.version != TRANSFER_FORMAT_VERSION {
            warn!(
                "event=note_import module=transfer status=error error_code=unsupported_version version={}",
                document.version
            );
            return Err(TransferError::UnsupportedVersion(document.version));
        }
        if document.title.is_empty() {
            return Err(TransferError::EmptyTitle);
        }

        let note = document.into_note();
        if !note.is_persisted() {
            let created = self.repo.save(&note)?;
            info!(
                "event=note_import module=transfer status=ok action=created note_id={}",
                created.id
            );
            return Ok(created);
        }

        match self.repo.find_by_id(&note.id) {
            Ok(existing) => {
                if on_duplicate(&existing) {
                    let overwritten = self.repo.overwrite(&note)?;
                    info!(
                        "event=note_import module=transfer status=ok action=overwritten note_id={}",
                        overwritten.id
                    );
                    Ok(overwritten)
                } else {
                    info!(
                        "event=note_import module=transfer status=ok action=kept_existing note_id={}",
                        existing.id
                    );
                    Ok(existing)
                }
            }
            Err(RepoError::NotFound(_)) => {
                self.repo.upsert(&note)?;
                info!(
                    "event=note_import module=transfer status=ok action=inserted note_id={}",
                    note.id
                );
                Ok(note)
            }
            Err(err) => {
                error!(
                    "event=note_import module=transfer status=error note_id={} error={}",
                    note.id, err
                );
                Err(err.into())
            }
        }
    }
}

/// Resolves the output path of a single-file export.
fn export_target(path: &Path) -> PathBuf {
    let path = if path.as_os_str().is_empty() {
        PathBuf::from(format!(
            "{}_{EXPORT_FILE_SUFFIX}.json",
            now_millis().format(EXPORT_TIMESTAMP_FORMAT)
        ))
    } else {
        path.to_path_buf()
    };
    ensure_json_extension(path)
}

/// Appends `.json` unless the path already ends with that extension.
pub fn ensure_json_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "json") {
        return path;
    }
    let mut raw = path.into_os_string();
    raw.push(".json");
    PathBuf::from(raw)
}

/// File name for one note of a directory export.
///
/// `<updated_at YYYYMMDD_HHMMSS>_<first 8 id chars>_nota_exported.json`,
/// with unsafe id characters replaced by `_`.
pub fn batch_file_name(note: &Note) -> String {
    format!("{}_{EXPORT_FILE_SUFFIX}.json", batch_file_stem(note))
}

fn batch_file_stem(note: &Note) -> String {
    let id_prefix = note
        .id
        .chars()
        .take(EXPORT_ID_PREFIX_CHARS)
        .collect::<String>();
    let id_prefix = UNSAFE_FILENAME_CHARS_RE.replace_all(&id_prefix, "_");
    format!(
        "{}_{}",
        note.updated_at.format(EXPORT_TIMESTAMP_FORMAT),
        id_prefix
    )
}

fn unique_batch_file_name(note: &Note, used: &mut HashSet<String>) -> String {
    let name = batch_file_name(note);
    if used.insert(name.clone()) {
        return name;
    }

    let stem = batch_file_stem(note);
    let mut counter = 2usize;
    loop {
        let candidate = format!("{stem}_{counter}_{EXPORT_FILE_SUFFIX}.json");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn json_files_in(dir: &Path) -> TransferResult<Vec<PathBuf>> {
    let io_error = |source| TransferError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> TransferResult<T> {
    if path.as_os_str().is_empty() {
        return Err(TransferError::EmptyPath);
    }
    let data = fs::read(path).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&data)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> TransferResult<()> {
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(path, data).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })
}
