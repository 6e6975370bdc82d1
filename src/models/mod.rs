//! Data models for the Slurm job queue.
//!
//! This module provides the job rows parsed from `squeue`, the index built
//! over one queue snapshot, state classification and configuration types.

mod config;
mod index;
mod job;
mod state;

pub use config::DashConfig;
pub use index::JobIndex;
pub use job::{JobKey, JobRow, NodeLogPaths};
pub use state::JobState;
