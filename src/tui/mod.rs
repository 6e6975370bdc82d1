//! Terminal User Interface for sqdash
//!
//! An interactive dashboard over the user's Slurm queue:
//! - Job table with sorting and state colouring
//! - Log viewer for stdout/stderr with per-node pagination
//! - Manual and optional automatic refresh, never more than one at a time
//! - Dual-channel event architecture (priority input, bounded data)

pub mod app;
pub mod event;
pub mod runtime;
pub mod theme;
pub mod ui;

use std::io::{self, stdout, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use crate::dashboard::Dashboard;
use crate::models::DashConfig;
use crate::slurm::QueueSource;
use crate::tui::app::App;
use crate::tui::runtime::{
    create_channels, run_event_loop, spawn_auto_refresh, spawn_input_task, spawn_refresh_worker,
    spawn_ui_tick, TuiRuntime,
};
use crate::tui::theme::Theme;

/// Terminal capability requirements for TUI mode
#[derive(Debug)]
pub struct TerminalCapabilities {
    pub is_tty: bool,
    pub term_type: String,
    pub supports_alternate_screen: bool,
}

impl TerminalCapabilities {
    /// Detect terminal capabilities
    pub fn detect() -> Self {
        let term_type = std::env::var("TERM").unwrap_or_default();
        Self::from_parts(stdout().is_terminal(), term_type)
    }

    fn from_parts(is_tty: bool, term_type: String) -> Self {
        let supports_alternate_screen = !matches!(term_type.as_str(), "dumb" | "" | "unknown");
        Self {
            is_tty,
            term_type,
            supports_alternate_screen,
        }
    }

    /// Check if terminal is suitable for TUI mode
    pub fn is_suitable(&self) -> bool {
        self.is_tty && self.supports_alternate_screen
    }

    /// Get error message for unsuitable terminal
    pub fn error_message(&self) -> String {
        if !self.is_tty {
            "TUI mode requires an interactive terminal (stdout is not a TTY).\n\
             Hint: Use 'sqdash jobs' or 'sqdash paths <JOB>' instead."
                .to_string()
        } else if !self.supports_alternate_screen {
            format!(
                "Terminal type '{}' may not support TUI mode.\n\
                 Hint: Set TERM to a supported value (e.g., xterm-256color) or use CLI mode.",
                if self.term_type.is_empty() {
                    "(unset)"
                } else {
                    &self.term_type
                }
            )
        } else {
            "Unknown terminal capability issue.".to_string()
        }
    }
}

/// Run the TUI application on an already-loaded dashboard
pub async fn run_tui(
    dashboard: Dashboard,
    source: Arc<dyn QueueSource>,
    config: DashConfig,
    config_warnings: Vec<String>,
) -> Result<()> {
    let capabilities = TerminalCapabilities::detect();
    if !capabilities.is_suitable() {
        bail!("{}", capabilities.error_message());
    }

    let theme = Theme::from_name(&config.display.theme);
    tracing::debug!(theme = ?theme.name, "starting TUI");
    let auto_interval = config.refresh.auto_interval;

    let channels = create_channels();
    let app = App::new(
        dashboard,
        config,
        config_warnings,
        source.describe(),
        channels.data_tx.clone(),
    );

    let mut terminal = setup_terminal()?;

    let mut runtime = TuiRuntime::new();
    runtime.track(spawn_input_task(channels.input_tx, runtime.cancel_token()));
    runtime.track(spawn_refresh_worker(
        source,
        channels.refresh_rx,
        channels.data_tx.clone(),
        runtime.cancel_token(),
    ));
    runtime.track(spawn_ui_tick(channels.data_tx.clone(), runtime.cancel_token()));
    if auto_interval > 0 {
        tracing::info!(seconds = auto_interval, "auto-refresh enabled");
        runtime.track(spawn_auto_refresh(
            channels.data_tx.clone(),
            runtime.cancel_token(),
            Duration::from_secs(auto_interval),
        ));
    }
    drop(channels.data_tx);

    let result = run_event_loop(
        app,
        channels.input_rx,
        channels.data_rx,
        channels.refresh_tx,
        |app| {
            terminal.draw(|frame| ui::render(app, &theme, frame))?;
            Ok(())
        },
    )
    .await;

    runtime.shutdown().await;
    restore_terminal(&mut terminal)?;

    result.map(|_| ())
}

/// Setup the terminal for TUI mode
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// How long runtime teardown waits for blocking work after the UI has exited
const BLOCKING_SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Run the TUI with the tokio runtime (entry point from main)
pub fn run(
    dashboard: Dashboard,
    source: Arc<dyn QueueSource>,
    config: DashConfig,
    config_warnings: Vec<String>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    block_on_then_abandon(rt, run_tui(dashboard, source, config, config_warnings))
}

/// Drive `future` to completion, then tear the runtime down without waiting
/// for a squeue call still sitting on the blocking pool.
fn block_on_then_abandon<F: Future>(rt: tokio::runtime::Runtime, future: F) -> F::Output {
    let output = rt.block_on(future);
    rt.shutdown_timeout(BLOCKING_SHUTDOWN_GRACE);
    output
}
