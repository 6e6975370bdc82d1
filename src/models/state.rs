//! Job state classification.
//!
//! squeue reports states as free-form strings; the dashboard only needs to
//! know whether a job has started (so its log files may exist) and how to
//! colour it. Unrecognised strings map to `Unknown` and are displayed raw.
//!
//! Reference: https://slurm.schedmd.com/job_state_codes.html

/// Job state parsed from a squeue state string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Unknown,
    // Active states
    Running,
    Pending,
    Configuring,
    Suspended,
    // Transitional flag (commonly shown instead of base state)
    Completing,
    // Successful completion
    Completed,
    // Termination states
    Cancelled,
    Failed,
    Timeout,
    Preempted,
    NodeFail,
    BootFail,
    Deadline,
    OutOfMemory,
}

impl JobState {
    /// Create a JobState from a single state string.
    ///
    /// Handles both full names (e.g., "RUNNING") and short codes (e.g., "R").
    /// Also handles state strings with additional info like "CANCELLED by 12345".
    #[must_use]
    pub fn from_state_string(state: &str) -> Self {
        match state.split_whitespace().next() {
            Some("RUNNING") | Some("R") => Self::Running,
            Some("PENDING") | Some("PD") => Self::Pending,
            Some("CONFIGURING") | Some("CF") => Self::Configuring,
            Some("SUSPENDED") | Some("S") => Self::Suspended,
            Some("COMPLETING") | Some("CG") => Self::Completing,
            Some("COMPLETED") | Some("CD") => Self::Completed,
            Some("CANCELLED") | Some("CA") => Self::Cancelled,
            Some("FAILED") | Some("F") => Self::Failed,
            Some("TIMEOUT") | Some("TO") => Self::Timeout,
            Some("PREEMPTED") | Some("PR") => Self::Preempted,
            Some("NODE_FAIL") | Some("NF") => Self::NodeFail,
            Some("BOOT_FAIL") | Some("BF") => Self::BootFail,
            Some("DEADLINE") | Some("DL") => Self::Deadline,
            Some("OUT_OF_MEMORY") | Some("OOM") => Self::OutOfMemory,
            _ => Self::Unknown,
        }
    }

    /// Jobs in these states have been dispatched to nodes and write logs.
    #[must_use]
    pub fn has_started(&self) -> bool {
        matches!(self, Self::Running | Self::Completing | Self::Suspended)
    }

    /// Sort rank used by the jobs table (active work first).
    #[must_use]
    pub fn sort_rank(&self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Completing => 1,
            Self::Suspended => 2,
            Self::Configuring => 3,
            Self::Pending => 4,
            Self::Completed => 5,
            Self::Cancelled | Self::Preempted => 6,
            Self::Failed
            | Self::Timeout
            | Self::NodeFail
            | Self::BootFail
            | Self::Deadline
            | Self::OutOfMemory => 7,
            Self::Unknown => 8,
        }
    }
}
