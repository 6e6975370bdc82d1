//! Error types for the queue pipeline and the dashboard.
//!
//! Each stage of a refresh (query, parse, index) has its own error so the
//! dashboard can report exactly which step failed. A missing log file is
//! deliberately absent here: it is rendered as a placeholder, not raised.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::JobKey;

/// Failure to obtain raw queue output.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{} not found (is Slurm installed and on PATH?)", program.display())]
    NotFound { program: PathBuf },

    #[error("failed to execute {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} exited with code {code}: {stderr}", program.display())]
    NonZeroExit {
        program: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("{} timed out after {}s", program.display(), timeout.as_secs())]
    Timeout { program: PathBuf, timeout: Duration },

    #[error("could not read queue snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A data line that does not match the fixed squeue field layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: expected {expected} fields, found {actual}")]
    MalformedRow {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: invalid node count '{value}'")]
    InvalidNodeCount { line: usize, value: String },
}

/// Failure to build the job index from parsed rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("scheduler reported job {0} more than once")]
    DuplicateKey(JobKey),
}

/// Any failure of a fetch, parse and index cycle.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("squeue: {0}")]
    Query(#[from] QueryError),

    #[error("parse: {0}")]
    Parse(#[from] ParseError),

    #[error("index: {0}")]
    Index(#[from] IndexError),

    /// The background task running the cycle died before reporting.
    #[error("refresh worker: {0}")]
    Worker(String),
}

/// Controller faults that indicate the UI and the index disagree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("selected job {0} is not in the current queue snapshot")]
    UnknownKey(JobKey),
}
