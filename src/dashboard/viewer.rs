//! Log viewer state: which job and node are selected, and what the
//! stdout/stderr panes show for them.
//!
//! Reading a log never fails from the caller's point of view. Missing and
//! unreadable files become placeholder text in the pane.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::{JobKey, JobRow};

/// Pane title shown before any job is selected.
pub const NO_JOB_SELECTED: &str = "No Job Selected";

/// Pane body shown before any job is selected.
pub const NO_LOG_SELECTED: &str = "No Log File Selected";

/// One of the two output streams of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogStream {
    #[default]
    Stdout,
    Stderr,
}

impl LogStream {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Stdout => "STDOUT",
            Self::Stderr => "STDERR",
        }
    }

    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Stdout => Self::Stderr,
            Self::Stderr => Self::Stdout,
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Body of a log pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogContent {
    /// File contents in order. `dropped` counts leading lines cut by the line cap.
    Lines { lines: Vec<String>, dropped: usize },
    /// A single message standing in for the file.
    Placeholder(String),
}

impl LogContent {
    #[must_use]
    pub fn line_count(&self) -> usize {
        match self {
            Self::Lines { lines, .. } => lines.len(),
            Self::Placeholder(_) => 1,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// A titled log pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPane {
    pub stream: LogStream,
    pub path: Option<PathBuf>,
    pub content: LogContent,
}

impl LogPane {
    fn empty(stream: LogStream) -> Self {
        Self {
            stream,
            path: None,
            content: LogContent::Placeholder(NO_LOG_SELECTED.to_string()),
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        match &self.path {
            Some(path) => format!("{} Log File: {}", self.stream, path.display()),
            None => NO_JOB_SELECTED.to_string(),
        }
    }
}

/// Both panes for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
    pub stdout: LogPane,
    pub stderr: LogPane,
}

impl Default for LogView {
    fn default() -> Self {
        Self {
            stdout: LogPane::empty(LogStream::Stdout),
            stderr: LogPane::empty(LogStream::Stderr),
        }
    }
}

impl LogView {
    /// Produce the panes for `row` on `node`.
    ///
    /// Jobs that have not started get a state message in both panes and the
    /// filesystem is not touched. `max_lines` of 0 means no cap.
    #[must_use]
    pub fn resolve(row: &JobRow, node: usize, max_lines: usize) -> Self {
        let stdout_path = row.stdout_path(node).map(Path::to_path_buf);
        let stderr_path = row.stderr_path(node).map(Path::to_path_buf);

        if !row.has_started() {
            let message = format!(
                "Selected job has not started yet, is in state: {}",
                row.state
            );
            return Self {
                stdout: LogPane {
                    stream: LogStream::Stdout,
                    path: stdout_path,
                    content: LogContent::Placeholder(message.clone()),
                },
                stderr: LogPane {
                    stream: LogStream::Stderr,
                    path: stderr_path,
                    content: LogContent::Placeholder(message),
                },
            };
        }

        Self {
            stdout: read_pane(LogStream::Stdout, stdout_path, max_lines),
            stderr: read_pane(LogStream::Stderr, stderr_path, max_lines),
        }
    }

    #[must_use]
    pub fn pane(&self, stream: LogStream) -> &LogPane {
        match stream {
            LogStream::Stdout => &self.stdout,
            LogStream::Stderr => &self.stderr,
        }
    }
}

fn read_pane(stream: LogStream, path: Option<PathBuf>, max_lines: usize) -> LogPane {
    let content = match &path {
        Some(path) => read_log(path, max_lines),
        // Unreachable for rows produced by the parser, which always resolve node 0
        None => LogContent::Placeholder(NO_LOG_SELECTED.to_string()),
    };
    LogPane {
        stream,
        path,
        content,
    }
}

/// Read a log file into lines, keeping only the last `max_lines` when non-zero.
#[must_use]
pub fn read_log(path: &Path, max_lines: usize) -> LogContent {
    if !path.exists() {
        return LogContent::Placeholder(format!("Path does not exist: {}", path.display()));
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "log read failed");
            return LogContent::Placeholder(format!("Could not read {}: {}", path.display(), e));
        }
    };

    let mut lines: Vec<String> = String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect();

    let dropped = if max_lines > 0 && lines.len() > max_lines {
        let excess = lines.len() - max_lines;
        lines.drain(..excess);
        excess
    } else {
        0
    };

    LogContent::Lines { lines, dropped }
}

/// Direction for node pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeDirection {
    Next,
    Previous,
}

/// The selected job and which of its node logs is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSelection {
    pub key: JobKey,
    pub node: usize,
    pub node_count: usize,
}

impl ViewerSelection {
    #[must_use]
    pub fn new(row: &JobRow) -> Self {
        Self {
            key: row.key(),
            node: 0,
            node_count: row.log_node_count(),
        }
    }

    /// True when there is more than one node log to page through.
    #[must_use]
    pub fn is_multi_node(&self) -> bool {
        self.node_count > 1
    }

    /// Move to the neighbouring node, wrapping at both ends.
    ///
    /// Returns false (and changes nothing) for single-node jobs.
    pub fn step(&mut self, direction: NodeDirection) -> bool {
        if !self.is_multi_node() {
            return false;
        }
        let delta = match direction {
            NodeDirection::Next => 1,
            NodeDirection::Previous => -1,
        };
        let count = self.node_count as i64;
        self.node = (self.node as i64 + delta).rem_euclid(count) as usize;
        true
    }

    /// Adopt a fresh row for the same key, keeping the node when still valid.
    pub fn rebase(&mut self, row: &JobRow) {
        self.node_count = row.log_node_count();
        if self.node >= self.node_count {
            self.node = 0;
        }
    }
}
