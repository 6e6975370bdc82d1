//! Interface to the Slurm job queue.
//!
//! This module runs `squeue` with a fixed pipe-delimited format and returns
//! its raw output lines. A saved `squeue` output file can stand in for the
//! live scheduler. Both implement [`QueueSource`], which is all the
//! dashboard knows about.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::QueryError;

/// `--Format` argument producing the eleven pipe-delimited fields the parser expects
pub const SQUEUE_FORMAT: &str = "--Format=JobID:|,ArrayJobID:|,ArrayTaskID:|,Partition:|,Name:|,State:|,TimeUsed:|,NumNodes:|,Nodelist:|,STDOUT:|,STDERR:";

/// Default time a squeue invocation may take before it is killed
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// How often a running squeue child is polled for completion
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Anything that can produce one raw queue snapshot.
///
/// Implementations block; the TUI calls them from `spawn_blocking`.
pub trait QueueSource: Send + Sync {
    /// Raw output lines, header included.
    fn fetch(&self) -> Result<Vec<String>, QueryError>;

    /// Short human-readable description for the status bar.
    fn describe(&self) -> String;
}

/// How the Slurm binary path was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResolution {
    /// Explicitly configured via config file, environment or CLI flag
    Configured,
    /// Auto-detected via PATH (found squeue in user's PATH)
    AutoDetected,
    /// Fell back to default /usr/bin and squeue was found there
    Fallback,
    /// Fell back to default /usr/bin but squeue was NOT found (likely misconfigured)
    FallbackUnverified,
}

/// Result of finding the Slurm binary path
#[derive(Debug, Clone)]
pub struct SlurmPathResult {
    pub path: PathBuf,
    pub resolution: PathResolution,
}

/// Find the directory containing Slurm binaries.
///
/// Resolution order:
/// 1. Explicit path provided (from config) - validated to be an existing directory.
///    If it isn't, a warning is logged and resolution continues to step 2.
/// 2. Auto-detect via PATH using the `which` crate to find `squeue`, then take
///    the parent directory.
/// 3. Fallback to `/usr/bin` if PATH detection fails.
pub fn find_slurm_bin_path(config_path: Option<&Path>) -> SlurmPathResult {
    if let Some(path) = config_path {
        if path.is_dir() {
            return SlurmPathResult {
                path: path.to_path_buf(),
                resolution: PathResolution::Configured,
            };
        }
        tracing::warn!(
            "Configured slurm_bin_path '{}' is not a valid directory, trying auto-detection",
            path.display()
        );
    }

    if let Ok(squeue_path) = which::which("squeue")
        && let Some(parent) = squeue_path.parent()
    {
        return SlurmPathResult {
            path: parent.to_path_buf(),
            resolution: PathResolution::AutoDetected,
        };
    }

    let fallback_path = PathBuf::from("/usr/bin");
    let resolution = if fallback_path.join("squeue").exists() {
        PathResolution::Fallback
    } else {
        PathResolution::FallbackUnverified
    };
    SlurmPathResult {
        path: fallback_path,
        resolution,
    }
}

/// Live queue source backed by `squeue --me`.
#[derive(Debug, Clone)]
pub struct SlurmInterface {
    /// Path to directory containing Slurm binaries
    pub slurm_bin_path: PathBuf,
    resolution: PathResolution,
    timeout: Duration,
}

impl SlurmInterface {
    /// Create a SlurmInterface using the configured binary directory (or auto-detect).
    pub fn with_config(config_path: Option<&Path>, timeout: Duration) -> Self {
        let result = find_slurm_bin_path(config_path);
        Self {
            slurm_bin_path: result.path,
            resolution: result.resolution,
            timeout,
        }
    }

    /// True when squeue was not found anywhere and `/usr/bin` is a guess.
    #[must_use]
    pub fn is_unverified_fallback(&self) -> bool {
        self.resolution == PathResolution::FallbackUnverified
    }

    #[must_use]
    pub fn squeue_path(&self) -> PathBuf {
        self.slurm_bin_path.join("squeue")
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl QueueSource for SlurmInterface {
    fn fetch(&self) -> Result<Vec<String>, QueryError> {
        let program = self.squeue_path();
        let mut cmd = Command::new(&program);
        cmd.arg("--me").arg(SQUEUE_FORMAT);

        tracing::debug!(program = %program.display(), "running squeue");
        let started = Instant::now();
        let stdout = run_with_timeout(cmd, &program, self.timeout)?;
        let lines = split_lines(&stdout);
        tracing::debug!(
            lines = lines.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "squeue finished"
        );
        Ok(lines)
    }

    fn describe(&self) -> String {
        "squeue --me".to_string()
    }
}

/// Queue source that replays a saved `squeue` output file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QueueSource for SnapshotFile {
    fn fetch(&self) -> Result<Vec<String>, QueryError> {
        let bytes = std::fs::read(&self.path).map_err(|source| QueryError::Snapshot {
            path: self.path.clone(),
            source,
        })?;
        Ok(split_lines(&bytes))
    }

    fn describe(&self) -> String {
        format!("snapshot {}", self.path.display())
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

fn drain<R: Read>(mut pipe: R) -> Vec<u8> {
    let mut buf = Vec::new();
    // A read error just truncates what we report
    let _ = pipe.read_to_end(&mut buf);
    buf
}

fn spawn_drain<R: Read + Send + 'static>(pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || drain(pipe))
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
///
/// Both pipes are drained on helper threads so a chatty child cannot block
/// on a full pipe buffer while we wait for it. Returns captured stdout.
fn run_with_timeout(
    mut cmd: Command,
    program: &Path,
    timeout: Duration,
) -> Result<Vec<u8>, QueryError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => QueryError::NotFound {
                program: program.to_path_buf(),
            },
            _ => QueryError::Spawn {
                program: program.to_path_buf(),
                source,
            },
        })?;

    let stdout_reader = child.stdout.take().map(spawn_drain);
    let stderr_reader = child.stderr.take().map(spawn_drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                tracing::warn!(
                    program = %program.display(),
                    ?timeout,
                    "killing squeue after timeout"
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(QueryError::Timeout {
                    program: program.to_path_buf(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                return Err(QueryError::Spawn {
                    program: program.to_path_buf(),
                    source,
                });
            }
        }
    };

    let stdout = stdout_reader
        .map(|handle| handle.join().unwrap_or_default())
        .unwrap_or_default();
    let stderr = stderr_reader
        .map(|handle| handle.join().unwrap_or_default())
        .unwrap_or_default();

    if !status.success() {
        return Err(QueryError::NonZeroExit {
            program: program.to_path_buf(),
            code: status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    Ok(stdout)
}
