//! Job queue entries as parsed from `squeue` output.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use super::state::JobState;

/// Task id squeue prints for jobs that are not part of an array.
pub const NO_ARRAY_TASK: &str = "N/A";

/// Identity of a displayed row: `(array_job_id, array_task_id)`.
///
/// For plain jobs squeue reports the job id as the array job id and
/// `N/A` as the task id, so the pair is unique per queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobKey {
    pub array_job_id: String,
    pub array_task_id: String,
}

impl JobKey {
    pub fn new(array_job_id: impl Into<String>, array_task_id: impl Into<String>) -> Self {
        Self {
            array_job_id: array_job_id.into(),
            array_task_id: array_task_id.into(),
        }
    }

    /// True when the key names one task of an array job, i.e. the task id is
    /// neither empty nor squeue's non-array sentinel.
    #[must_use]
    pub fn is_array_task(&self) -> bool {
        !(self.array_task_id.is_empty() || self.array_task_id == NO_ARRAY_TASK)
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array_task() {
            write!(f, "{}_{}", self.array_job_id, self.array_task_id)
        } else {
            write!(f, "{}", self.array_job_id)
        }
    }
}

/// Error type for parsing a `JobKey` from the command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job key '{0}' (expected JOBID or ARRAYJOBID_TASKID)")]
pub struct ParseJobKeyError(String);

impl FromStr for JobKey {
    type Err = ParseJobKeyError;

    /// Parses `12345` (plain job) or `12345_7` (array task).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (job, task) = match s.split_once('_') {
            Some((job, task)) => (job, task),
            None => (s, NO_ARRAY_TASK),
        };

        if job.is_empty() || task.is_empty() {
            return Err(ParseJobKeyError(s.to_string()));
        }

        Ok(JobKey::new(job, task))
    }
}

/// Resolved log file paths, keyed by node index within the job.
pub type NodeLogPaths = BTreeMap<usize, PathBuf>;

/// One scheduler queue entry with its resolved log paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRow {
    pub job_id: String,
    pub array_job_id: String,
    pub array_task_id: String,
    pub partition: String,
    pub name: String,
    pub state: String,
    pub time_used: String,
    pub num_nodes: u32,
    pub nodelist: String,
    pub stdout_template: String,
    pub stderr_template: String,
    pub stdout_paths: NodeLogPaths,
    pub stderr_paths: NodeLogPaths,
}

impl JobRow {
    /// Column titles for the display fields, in squeue order.
    pub const DISPLAY_COLUMNS: [&'static str; 9] = [
        "JobID",
        "ArrayJobID",
        "ArrayTaskID",
        "Partition",
        "Name",
        "State",
        "TimeUsed",
        "Nodes",
        "NodeList",
    ];

    #[must_use]
    pub fn key(&self) -> JobKey {
        JobKey::new(&self.array_job_id, &self.array_task_id)
    }

    #[must_use]
    pub fn job_state(&self) -> JobState {
        JobState::from_state_string(&self.state)
    }

    /// Whether the job has been dispatched, i.e. its log files may exist.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.job_state().has_started()
    }

    /// Number of distinct log files per stream (1 unless `%n` was expanded).
    #[must_use]
    pub fn log_node_count(&self) -> usize {
        self.stdout_paths.len().max(1)
    }

    #[must_use]
    pub fn stdout_path(&self, node: usize) -> Option<&Path> {
        self.stdout_paths.get(&node).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn stderr_path(&self, node: usize) -> Option<&Path> {
        self.stderr_paths.get(&node).map(PathBuf::as_path)
    }

    /// Display values matching `DISPLAY_COLUMNS`.
    #[must_use]
    pub fn display_fields(&self) -> [String; 9] {
        [
            self.job_id.clone(),
            self.array_job_id.clone(),
            self.array_task_id.clone(),
            self.partition.clone(),
            self.name.clone(),
            self.state.clone(),
            self.time_used.clone(),
            self.num_nodes.to_string(),
            self.nodelist.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key_display() {
        assert_eq!(JobKey::new("100", "3").to_string(), "100_3");
        assert_eq!(JobKey::new("100", NO_ARRAY_TASK).to_string(), "100");
        assert_eq!(JobKey::new("100", "").to_string(), "100");
    }

    #[test]
    fn test_is_array_task() {
        assert!(JobKey::new("100", "3").is_array_task());
        assert!(!JobKey::new("100", NO_ARRAY_TASK).is_array_task());
        assert!(!JobKey::new("100", "").is_array_task());
    }

    #[test]
    fn test_job_key_from_str() {
        let key: JobKey = "4321_12".parse().unwrap();
        assert_eq!(key, JobKey::new("4321", "12"));

        let key: JobKey = "4321".parse().unwrap();
        assert_eq!(key, JobKey::new("4321", NO_ARRAY_TASK));

        assert!("".parse::<JobKey>().is_err());
        assert!("_4".parse::<JobKey>().is_err());
        assert!("4_".parse::<JobKey>().is_err());
    }

    #[test]
    fn test_job_key_ordering_groups_array_tasks() {
        let mut keys = vec![
            JobKey::new("20", "2"),
            JobKey::new("10", NO_ARRAY_TASK),
            JobKey::new("20", "1"),
        ];
        keys.sort();
        assert_eq!(keys[0], JobKey::new("10", NO_ARRAY_TASK));
        assert_eq!(keys[1], JobKey::new("20", "1"));
    }
}
