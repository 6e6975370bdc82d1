//! Plain-terminal output for the non-interactive commands

use owo_colors::OwoColorize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style, Width},
    Table, Tabled,
};

use crate::formatting::truncate_string;
use crate::models::{JobIndex, JobRow, JobState};

#[derive(Tabled)]
struct JobTableRow {
    #[tabled(rename = "JobID")]
    job_id: String,

    #[tabled(rename = "ArrayJobID")]
    array_job_id: String,

    #[tabled(rename = "ArrayTaskID")]
    array_task_id: String,

    #[tabled(rename = "Partition")]
    partition: String,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "State")]
    state: String,

    #[tabled(rename = "TimeUsed")]
    time_used: String,

    #[tabled(rename = "Nodes")]
    nodes: String,

    #[tabled(rename = "NodeList")]
    nodelist: String,
}

/// Format job state with appropriate coloring
fn format_job_state(job: &JobRow) -> String {
    let state_str = job.state.as_str();

    match job.job_state() {
        JobState::Running => state_str.green().to_string(),
        JobState::Pending | JobState::Configuring => state_str.yellow().to_string(),
        JobState::Completed => state_str.bright_blue().to_string(),
        JobState::Failed
        | JobState::Timeout
        | JobState::NodeFail
        | JobState::BootFail
        | JobState::OutOfMemory
        | JobState::Deadline => state_str.red().to_string(),
        JobState::Cancelled | JobState::Preempted => state_str.magenta().to_string(),
        JobState::Suspended => state_str.cyan().to_string(),
        JobState::Completing => state_str.bright_yellow().to_string(),
        JobState::Unknown => state_str.white().to_string(),
    }
}

/// Render the queue snapshot as a table.
pub fn format_jobs(index: &JobIndex, name_max_length: usize) -> String {
    if index.is_empty() {
        return "No jobs in the queue".yellow().to_string();
    }

    let rows: Vec<JobTableRow> = index
        .iter()
        .map(|job| JobTableRow {
            job_id: job.job_id.clone(),
            array_job_id: job.array_job_id.clone(),
            array_task_id: job.array_task_id.clone(),
            partition: job.partition.clone(),
            name: truncate_string(&job.name, name_max_length),
            state: format_job_state(job),
            time_used: job.time_used.clone(),
            nodes: job.num_nodes.to_string(),
            nodelist: job.nodelist.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Width::wrap(200).keep_words(true))
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    format!(
        "{}\n{} jobs, {} started",
        table,
        index.len(),
        index.started_count()
    )
}

/// Render the queue snapshot as pretty-printed JSON (rows with resolved paths).
pub fn format_jobs_json(index: &JobIndex) -> serde_json::Result<String> {
    serde_json::to_string_pretty(index.rows())
}

/// List the resolved log files of one job, node by node.
pub fn format_log_paths(job: &JobRow) -> String {
    let mut out = format!(
        "{} {} ({})\n",
        "Job".bold(),
        job.key().to_string().bold(),
        format_job_state(job)
    );

    if !job.has_started() {
        out.push_str(&format!(
            "  {}\n",
            "not started yet, log files may not exist".bright_black()
        ));
    }

    for node in 0..job.log_node_count() {
        if job.log_node_count() > 1 {
            out.push_str(&format!("  node {}\n", node));
        }
        for (label, path) in [
            ("stdout", job.stdout_path(node)),
            ("stderr", job.stderr_path(node)),
        ] {
            let Some(path) = path else {
                continue;
            };
            let marker = if path.exists() {
                "●".green().to_string()
            } else {
                "○".bright_black().to_string()
            };
            out.push_str(&format!("    {} {:<6} {}\n", marker, label, path.display()));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn index() -> JobIndex {
        let lines = [
            "HEADER",
            "1|1|N/A|cpu|short|RUNNING|0:01|1|n1|/logs/%j.out|/logs/%j.err",
            "5|4|1|gpu|a-very-long-job-name-indeed|PENDING|0:00|2|(None)|/logs/o_%n|/logs/e_%n",
        ];
        JobIndex::build(parse(&lines).unwrap()).unwrap()
    }

    #[test]
    fn test_format_jobs_table() {
        let output = format_jobs(&index(), 10);
        assert!(output.contains("JobID"));
        assert!(output.contains("NodeList"));
        assert!(output.contains("short"));
        assert!(output.contains("a-very-..."));
        assert!(output.ends_with("2 jobs, 1 started"));
    }

    #[test]
    fn test_format_jobs_empty() {
        assert!(format_jobs(&JobIndex::default(), 10).contains("No jobs"));
    }

    #[test]
    fn test_format_jobs_json() {
        let json = format_jobs_json(&index()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["job_id"], "1");
        assert_eq!(value[0]["stdout_paths"]["0"], "/logs/1.out");
        assert_eq!(value[1]["stderr_paths"]["1"], "/logs/e_1");
    }

    #[test]
    fn test_format_log_paths_per_node() {
        let index = index();
        let job = index.find_by_job_id("5").unwrap();
        let output = format_log_paths(job);
        assert!(output.contains("4_1"));
        assert!(output.contains("node 1"));
        assert!(output.contains("/logs/o_0"));
        assert!(output.contains("/logs/e_1"));
        assert!(output.contains("not started"));
    }
}
