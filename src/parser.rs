//! Parsing of pipe-delimited squeue output into `JobRow`s.
//!
//! The query requests a fixed field order (see `slurm::SQUEUE_FORMAT`). Each
//! data line must split into exactly `FIELD_COUNT` fields; anything else
//! aborts the whole parse so a half-understood snapshot never reaches the UI.
//!
//! Log path templates are resolved here as well. Slurm's filename patterns
//! are treated as fixed tokens:
//! - `%A` array master job id, `%a` array task id
//! - `%n` node index relative to the job (one file per node)
//! - `%j` job id

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ParseError;
use crate::models::{JobRow, NodeLogPaths};

/// Field delimiter used in the squeue format string.
pub const DELIMITER: char = '|';

/// Number of fields per data line.
pub const FIELD_COUNT: usize = 11;

pub const ARRAY_JOB_TOKEN: &str = "%A";
pub const ARRAY_TASK_TOKEN: &str = "%a";
pub const NODE_TOKEN: &str = "%n";
pub const JOB_ID_TOKEN: &str = "%j";

/// Identifiers substituted into log path templates.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub job_id: &'a str,
    pub array_job_id: &'a str,
    pub array_task_id: &'a str,
    pub num_nodes: u32,
}

/// Resolved per-node paths for both streams of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLogPaths {
    pub stdout: NodeLogPaths,
    pub stderr: NodeLogPaths,
}

/// Which substitution rule a template pair resolves with.
///
/// Rules are checked in declaration order against the stdout template and
/// the first match wins; the stderr template follows the same rule so both
/// streams always have identical node keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderRule {
    ArrayTask,
    PerNode,
    JobId,
    Literal,
}

impl PlaceholderRule {
    #[must_use]
    pub fn detect(template: &str) -> Self {
        if template.contains(ARRAY_JOB_TOKEN) {
            Self::ArrayTask
        } else if template.contains(NODE_TOKEN) {
            Self::PerNode
        } else if template.contains(JOB_ID_TOKEN) {
            Self::JobId
        } else {
            Self::Literal
        }
    }
}

/// Resolve stdout/stderr templates into concrete per-node paths.
///
/// Pure: identical inputs always yield identical maps.
#[must_use]
pub fn resolve_log_paths(
    stdout_template: &str,
    stderr_template: &str,
    ctx: TemplateContext<'_>,
) -> ResolvedLogPaths {
    let rule = PlaceholderRule::detect(stdout_template);
    ResolvedLogPaths {
        stdout: resolve_template(stdout_template, rule, ctx),
        stderr: resolve_template(stderr_template, rule, ctx),
    }
}

fn resolve_template(
    template: &str,
    rule: PlaceholderRule,
    ctx: TemplateContext<'_>,
) -> NodeLogPaths {
    match rule {
        PlaceholderRule::ArrayTask => single(
            template
                .replace(ARRAY_JOB_TOKEN, ctx.array_job_id)
                .replace(ARRAY_TASK_TOKEN, ctx.array_task_id),
        ),
        PlaceholderRule::PerNode => {
            let with_job = template.replace(JOB_ID_TOKEN, ctx.job_id);
            (0..ctx.num_nodes.max(1) as usize)
                .map(|node| {
                    let path = with_job.replace(NODE_TOKEN, &node.to_string());
                    (node, PathBuf::from(path))
                })
                .collect()
        }
        PlaceholderRule::JobId => single(template.replace(JOB_ID_TOKEN, ctx.job_id)),
        PlaceholderRule::Literal => single(template.to_string()),
    }
}

fn single(path: String) -> NodeLogPaths {
    BTreeMap::from([(0, PathBuf::from(path))])
}

/// Parse raw squeue output (header line included) into job rows.
///
/// Trailing blank lines are ignored; a blank line between rows is malformed.
/// Line numbers in errors are 1-based and count the header, so they match
/// what `squeue` printed.
pub fn parse<S: AsRef<str>>(raw_lines: &[S]) -> Result<Vec<JobRow>, ParseError> {
    let end = raw_lines
        .iter()
        .rposition(|line| !line.as_ref().trim().is_empty())
        .map_or(0, |last| last + 1);

    raw_lines[..end]
        .iter()
        .enumerate()
        .skip(1)
        .map(|(idx, line)| parse_row(idx + 1, line.as_ref()))
        .collect()
}

/// Parse one data line. `line_number` is only used for error reporting.
pub fn parse_row(line_number: usize, line: &str) -> Result<JobRow, ParseError> {
    let fields: Vec<&str> = line.trim().split(DELIMITER).map(str::trim).collect();
    let actual = fields.len();
    let Ok(
        [
            job_id,
            array_job_id,
            array_task_id,
            partition,
            name,
            state,
            time_used,
            num_nodes,
            nodelist,
            stdout_template,
            stderr_template,
        ],
    ) = <[&str; FIELD_COUNT]>::try_from(fields)
    else {
        return Err(ParseError::MalformedRow {
            line: line_number,
            expected: FIELD_COUNT,
            actual,
        });
    };

    let num_nodes: u32 = num_nodes
        .parse()
        .map_err(|_| ParseError::InvalidNodeCount {
            line: line_number,
            value: num_nodes.to_string(),
        })?;
    // squeue prints 0 for some pending jobs before nodes are counted.
    let num_nodes = num_nodes.max(1);

    let paths = resolve_log_paths(
        stdout_template,
        stderr_template,
        TemplateContext {
            job_id,
            array_job_id,
            array_task_id,
            num_nodes,
        },
    );

    Ok(JobRow {
        job_id: job_id.to_string(),
        array_job_id: array_job_id.to_string(),
        array_task_id: array_task_id.to_string(),
        partition: partition.to_string(),
        name: name.to_string(),
        state: state.to_string(),
        time_used: time_used.to_string(),
        num_nodes,
        nodelist: nodelist.to_string(),
        stdout_template: stdout_template.to_string(),
        stderr_template: stderr_template.to_string(),
        stdout_paths: paths.stdout,
        stderr_paths: paths.stderr,
    })
}
