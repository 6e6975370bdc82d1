//! Logging setup.
//!
//! The dashboard owns the terminal, so tracing output goes to a log file
//! only. The filter comes from `SQDASH_LOG` (EnvFilter syntax) and defaults
//! to `info`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "SQDASH_LOG";
const LOG_FILE_NAME: &str = "sqdash.log";

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("no state directory available for logs (HOME is unset)")]
    NoStateDir,

    #[error("failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(String),
}

/// Default log location: `$XDG_STATE_HOME/sqdash/sqdash.log`, falling back
/// to `~/.local/state/sqdash/sqdash.log`.
pub fn default_log_path() -> Option<PathBuf> {
    let state_dir = match std::env::var_os("XDG_STATE_HOME") {
        Some(state) if !state.is_empty() => PathBuf::from(state),
        _ => dirs::home_dir()?.join(".local").join("state"),
    };
    Some(state_dir.join("sqdash").join(LOG_FILE_NAME))
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a global subscriber appending to `path` (or the default location).
///
/// Returns the file actually used. Failures are returned so the caller can
/// carry on without logging.
pub fn init(path: Option<&Path>) -> Result<PathBuf, LoggingError> {
    let log_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_log_path().ok_or(LoggingError::NoStateDir)?,
    };

    if let Some(dir) = log_path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|source| LoggingError::OpenFile {
            path: log_path.clone(),
            source,
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| LoggingError::SetGlobal(e.to_string()))?;

    tracing::info!("sqdash v{} starting", env!("CARGO_PKG_VERSION"));
    Ok(log_path)
}
