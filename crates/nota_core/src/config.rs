//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where the database and logs live and which search strategy
//!   to use.
//! - Load that description from an optional JSON file.
//!
//! # Invariants
//! - A missing config file yields [`CoreConfig::default`].
//! - Path expansion never reads process-global mutable state other than
//!   the environment.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Default database location, relative to the user's home directory.
pub const DEFAULT_DB_PATH: &str = "~/nota/data/nota.sqlite";

static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid env var regex")
});

/// Configuration loading/resolution error.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file exists but cannot be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`CoreConfig`].
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// `~` was used but no home directory is known.
    UnresolvedHome,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::UnresolvedHome => write!(f, "home directory could not be determined"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::UnresolvedHome => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime configuration for the note core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file path; `~`, `$VAR` and `${VAR}` are expanded.
    pub db_path: String,
    /// Log level passed to [`crate::logging::init_logging`].
    pub log_level: String,
    /// Absolute log directory; file logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Use the trigram index for search when it is available.
    pub full_text_search: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            full_text_search: true,
        }
    }
}

impl CoreConfig {
    /// Reads a JSON config file. Missing fields and a missing file fall back
    /// to defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    "event=config_load module=config status=default path={}",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns `db_path` with home and environment references expanded.
    pub fn resolve_db_path(&self) -> ConfigResult<PathBuf> {
        expand_path(&self.db_path)
    }
}

/// Expands a leading `~` and any `$VAR`/`${VAR}` references.
///
/// Unset variables expand to the empty string.
pub fn expand_path(raw: &str) -> ConfigResult<PathBuf> {
    let expanded = ENV_VAR_RE.replace_all(raw, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        std::env::var(name).unwrap_or_default()
    });

    if expanded == "~" {
        return dirs::home_dir().ok_or(ConfigError::UnresolvedHome);
    }
    if let Some(rest) = expanded
        .strip_prefix("~/")
        .or_else(|| expanded.strip_prefix("~\\"))
    {
        let home = dirs::home_dir().ok_or(ConfigError::UnresolvedHome)?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(expanded.into_owned()))
}
