//! sqdash - Terminal dashboard for Slurm job queues and job logs

mod dashboard;
mod display;
mod error;
mod formatting;
mod logging;
mod models;
mod parser;
mod slurm;
mod tui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};

use dashboard::{load_index, Dashboard};
use models::{DashConfig, JobKey};
use slurm::{QueueSource, SlurmInterface, SnapshotFile};

#[derive(Parser)]
#[command(name = "sqdash")]
#[command(about = "Terminal dashboard for your Slurm jobs and their log files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Read squeue output from a file instead of running squeue
    #[arg(long, global = true, value_name = "FILE")]
    from_file: Option<PathBuf>,

    /// Directory containing the Slurm binaries
    #[arg(long, global = true, value_name = "DIR")]
    slurm_path: Option<PathBuf>,

    /// Seconds before a squeue call is killed
    #[arg(long, global = true, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Log file (default: $XDG_STATE_HOME/sqdash/sqdash.log)
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive dashboard (default)
    #[command(alias = "ui")]
    Tui,

    /// Print the current queue
    Jobs {
        /// Print JSON (rows with resolved log paths) instead of a table
        #[arg(long)]
        json: bool,

        /// Watch mode: refresh every N seconds
        #[arg(short, long, value_name = "SECONDS", default_value = "0")]
        watch: f64,
    },

    /// Show the resolved log file paths of one job
    Paths {
        /// Job to inspect: JOBID or ARRAYJOBID_TASKID
        job: JobKey,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, mut warnings) = DashConfig::load()?;
    if let Some(path) = cli.slurm_path.clone() {
        config.system.slurm_bin_path = Some(path);
    }
    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }
        config.refresh.query_timeout = timeout;
    }

    // A logging failure only becomes a warning
    match logging::init(cli.log_file.as_deref()) {
        Ok(path) => tracing::info!(log = %path.display(), "sqdash starting"),
        Err(e) => warnings.push(format!("logging disabled: {}", e)),
    }
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let source = build_source(&cli, &config, &mut warnings);

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let mut dashboard = Dashboard::new(config.display.max_log_lines);
            dashboard
                .refresh_with(source.as_ref())
                .with_context(|| format!("initial queue load from {} failed", source.describe()))?;
            tui::run(dashboard, source, config, warnings)?;
        }
        Commands::Jobs { json, watch } => {
            let name_len = config.display.job_name_max_length;
            if watch > 0.0 {
                if json {
                    bail!("--json cannot be combined with --watch");
                }
                watch_loop(watch, || {
                    handle_jobs_command(source.as_ref(), false, name_len)
                })?;
            } else {
                let output = handle_jobs_command(source.as_ref(), json, name_len)?;
                println!("{}", output);
            }
        }
        Commands::Paths { job } => {
            let output = handle_paths_command(source.as_ref(), &job)?;
            print!("{}", output);
        }
    }

    Ok(())
}

/// Pick where queue snapshots come from.
fn build_source(
    cli: &Cli,
    config: &DashConfig,
    warnings: &mut Vec<String>,
) -> Arc<dyn QueueSource> {
    if let Some(path) = &cli.from_file {
        tracing::info!(path = %path.display(), "reading queue from snapshot file");
        return Arc::new(SnapshotFile::new(path));
    }

    let slurm = SlurmInterface::with_config(
        config.system.slurm_bin_path.as_deref(),
        Duration::from_secs(config.refresh.query_timeout),
    );
    tracing::info!(
        squeue = %slurm.squeue_path().display(),
        timeout_secs = slurm.timeout().as_secs(),
        "using live squeue"
    );
    if slurm.is_unverified_fallback() {
        warnings.push(format!(
            "squeue not found on PATH, trying {}",
            slurm.squeue_path().display()
        ));
    }
    Arc::new(slurm)
}

fn handle_jobs_command(source: &dyn QueueSource, json: bool, name_len: usize) -> Result<String> {
    let index = load_index(source)?;
    if json {
        Ok(display::format_jobs_json(&index)?)
    } else {
        Ok(display::format_jobs(&index, name_len))
    }
}

fn handle_paths_command(source: &dyn QueueSource, key: &JobKey) -> Result<String> {
    let index = load_index(source)?;
    // A bare id may also name one task of an array (its own JobID)
    let job = index
        .get(key)
        .or_else(|| {
            (!key.is_array_task())
                .then(|| index.find_by_job_id(&key.array_job_id))
                .flatten()
        })
        .with_context(|| format!("job {} is not in your queue", key))?;
    Ok(display::format_log_paths(job))
}

/// Watch loop that repeatedly executes a command with flicker-free updates
fn watch_loop<F>(interval: f64, command: F) -> Result<()>
where
    F: Fn() -> Result<String>,
{
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let cleanup = || -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Show, LeaveAlternateScreen)?;
        Ok(())
    };

    let result = (|| -> Result<()> {
        while running.load(Ordering::SeqCst) {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

            let output = match command() {
                Ok(s) => s,
                Err(e) => format!("Error: {:#}", e),
            };

            let screen_content = format!(
                "{}\n\nLast updated: {} | Refreshing every {}s | Press Ctrl+C to exit",
                output, timestamp, interval
            );

            // Synchronized update (DEC private mode 2026) avoids flicker
            write!(stdout, "\x1B[?2026h")?;
            write!(stdout, "\x1B[H{}\x1B[J", screen_content)?;
            write!(stdout, "\x1B[?2026l")?;
            stdout.flush()?;

            thread::sleep(Duration::from_secs_f64(interval));
        }
        Ok(())
    })();

    cleanup()?;
    println!("Watch mode stopped.");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "\
JOBID|ARRAY_JOB_ID|ARRAY_TASK_ID|PARTITION|NAME|STATE|TIME|NODES|NODELIST|STDOUT|STDERR
1235|1234|1|gpu|sweep|RUNNING|1:00|1|n1|/logs/%A_%a.out|/logs/%A_%a.err
99|99|N/A|cpu|single|PENDING|0:00|1|(None)|/logs/%j.out|/logs/%j.err
";

    fn snapshot() -> (tempfile::TempDir, SnapshotFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("squeue.txt");
        std::fs::write(&path, SNAPSHOT).unwrap();
        (dir, SnapshotFile::new(path))
    }

    #[test]
    fn test_cli_parses() {
        let args = ["sqdash", "paths", "1234_1", "--from-file", "q.txt"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.from_file, Some(PathBuf::from("q.txt")));
        match cli.command {
            Some(Commands::Paths { job }) => assert_eq!(job, JobKey::new("1234", "1")),
            _ => panic!("expected paths command"),
        }

        assert!(Cli::try_parse_from(["sqdash", "paths", "_3"]).is_err());
    }

    #[test]
    fn test_paths_command_by_key_and_job_id() {
        let (_dir, source) = snapshot();

        let by_key = handle_paths_command(&source, &JobKey::new("1234", "1")).unwrap();
        assert!(by_key.contains("/logs/1234_1.out"));

        let by_job_id = handle_paths_command(&source, &"1235".parse().unwrap()).unwrap();
        assert!(by_job_id.contains("/logs/1234_1.err"));

        let err = handle_paths_command(&source, &"7".parse().unwrap()).unwrap_err();
        assert!(err.to_string().contains("not in your queue"));
    }

    #[test]
    fn test_jobs_command_json() {
        let (_dir, source) = snapshot();
        let json = handle_jobs_command(&source, true, 30).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }
}
