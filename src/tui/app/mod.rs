//! Application state and core logic for the TUI
//!
//! `App` wraps the [`Dashboard`] controller with everything that only matters
//! on screen: table cursor and sort order, log scroll position, overlays and
//! transient feedback. The architecture follows a TEA-inspired pattern with
//! mutable state and method-based updates.

mod state;

pub use state::{
    ClipboardFeedback, FeedbackState, JobSortColumn, JobsViewState, LogPaneState, ModalState,
    SortMenuState,
};

use ratatui::layout::{Position, Rect};
use tokio::sync::mpsc;

use crate::dashboard::{Dashboard, LogPane};
use crate::models::{DashConfig, JobKey, JobRow};
use crate::tui::event::{DataEvent, EventResult, InputEvent, KeyAction};
use crate::tui::ui::DashboardLayout;

/// Lines moved per mouse wheel notch
const WHEEL_LINES: usize = 3;

/// Main application state
pub struct App {
    // Controller (index, selection, refresh bookkeeping, quit flag)
    pub dashboard: Dashboard,

    // Modal State
    pub modal: ModalState,

    // Jobs table: cursor, sort settings and display order (positions into the index)
    pub jobs_view: JobsViewState,
    pub order: Vec<usize>,

    pub log_pane: LogPaneState,

    pub feedback: FeedbackState,

    // Configuration
    pub config: DashConfig,
    /// Where snapshots come from, for the header line
    pub source_label: String,
    pub terminal_size: (u16, u16),

    // Communication
    pub data_tx: mpsc::Sender<DataEvent>,
}

impl App {
    /// Create the app around an already-loaded dashboard.
    pub fn new(
        dashboard: Dashboard,
        config: DashConfig,
        config_warnings: Vec<String>,
        source_label: String,
        data_tx: mpsc::Sender<DataEvent>,
    ) -> Self {
        let terminal_size = crossterm::terminal::size().unwrap_or((80, 24));
        let mut app = Self {
            dashboard,
            modal: ModalState::None,
            jobs_view: JobsViewState::default(),
            order: Vec::new(),
            log_pane: LogPaneState::default(),
            feedback: FeedbackState::new(config_warnings),
            config,
            source_label,
            terminal_size,
            data_tx,
        };
        app.rebuild_order();
        app
    }

    /// Handle an input event
    pub fn handle_input(&mut self, event: InputEvent) -> EventResult {
        match event {
            InputEvent::Key(key_event) => {
                let action = KeyAction::from_key_event(key_event);
                self.handle_action(action)
            }
            InputEvent::Resize(width, height) => {
                self.terminal_size = (width, height);
                EventResult::Continue
            }
            InputEvent::Mouse(mouse_event) => {
                let action = KeyAction::from_mouse_event(mouse_event);
                self.handle_action(action)
            }
        }
    }

    /// Handle a key action
    fn handle_action(&mut self, action: KeyAction) -> EventResult {
        // Help overlay takes priority
        if matches!(self.modal, ModalState::Help) {
            match action {
                KeyAction::Escape | KeyAction::ShowHelp => {
                    self.modal = ModalState::None;
                    return EventResult::Continue;
                }
                KeyAction::Quit => return self.quit(),
                _ => return EventResult::Unchanged,
            }
        }

        if matches!(self.modal, ModalState::Sort { .. }) {
            return self.handle_sort_action(action);
        }

        match action {
            KeyAction::Quit => self.quit(),

            // Table navigation
            KeyAction::MoveUp => {
                self.jobs_view.list_state.move_up();
                EventResult::Continue
            }
            KeyAction::MoveDown => {
                self.jobs_view.list_state.move_down(self.order.len());
                EventResult::Continue
            }
            KeyAction::MoveToTop => {
                self.jobs_view.list_state.move_to_top();
                EventResult::Continue
            }
            KeyAction::Select => {
                self.select_cursor_job();
                EventResult::Continue
            }

            // Log pane
            KeyAction::LogPageUp => {
                let total = self.current_pane().content.line_count();
                self.log_pane
                    .scroll_up(self.log_page_size(), total, self.log_body_height());
                EventResult::Continue
            }
            KeyAction::LogPageDown => {
                self.log_pane.scroll_down(self.log_page_size());
                EventResult::Continue
            }
            KeyAction::LogFollow => {
                self.log_pane.follow();
                EventResult::Continue
            }
            KeyAction::SwitchStream => {
                self.log_pane.switch_stream();
                EventResult::Continue
            }
            KeyAction::NextNode => {
                self.dashboard.next_node();
                self.log_pane.follow();
                EventResult::Continue
            }
            KeyAction::PreviousNode => {
                self.dashboard.previous_node();
                self.log_pane.follow();
                EventResult::Continue
            }
            KeyAction::ReloadLogs => {
                self.dashboard.reload();
                EventResult::Continue
            }

            // Actions
            KeyAction::Refresh => self.request_refresh(),
            KeyAction::OpenSort => {
                self.modal = ModalState::Sort {
                    menu: SortMenuState::new(),
                };
                EventResult::Continue
            }
            KeyAction::YankPath => {
                self.yank_current_path();
                EventResult::Continue
            }
            KeyAction::ShowHelp => {
                self.modal = ModalState::Help;
                EventResult::Continue
            }
            KeyAction::Escape => {
                self.dashboard.dismiss_error();
                EventResult::Continue
            }

            // Mouse
            KeyAction::MouseClick { row, column } => self.handle_mouse_click(row, column),
            KeyAction::MouseScrollUp { row } => self.handle_mouse_scroll(row, true),
            KeyAction::MouseScrollDown { row } => self.handle_mouse_scroll(row, false),

            KeyAction::Unknown => EventResult::Unchanged,
        }
    }

    fn quit(&mut self) -> EventResult {
        self.dashboard.quit();
        EventResult::Quit
    }

    /// Handle actions in sort menu mode
    fn handle_sort_action(&mut self, action: KeyAction) -> EventResult {
        match action {
            KeyAction::Escape | KeyAction::OpenSort => {
                self.modal = ModalState::None;
                EventResult::Continue
            }
            KeyAction::Quit => self.quit(),
            KeyAction::MoveUp => {
                if let Some(menu) = self.modal.sort_menu_mut() {
                    menu.move_up();
                }
                EventResult::Continue
            }
            KeyAction::MoveDown => {
                if let Some(menu) = self.modal.sort_menu_mut() {
                    menu.move_down();
                }
                EventResult::Continue
            }
            KeyAction::Select => {
                if let Some(column) = self
                    .modal
                    .sort_menu()
                    .and_then(SortMenuState::selected_column)
                {
                    self.jobs_view.apply_sort(column);
                    self.rebuild_order();
                }
                self.modal = ModalState::None;
                EventResult::Continue
            }
            _ => EventResult::Unchanged,
        }
    }

    /// Ask the controller for a refresh slot; the runtime dispatches it.
    fn request_refresh(&mut self) -> EventResult {
        if self.dashboard.begin_refresh() {
            EventResult::StartRefresh
        } else {
            EventResult::Unchanged
        }
    }

    /// Handle a data event
    pub fn handle_data(&mut self, event: DataEvent) -> EventResult {
        match event {
            DataEvent::Tick => {
                if self.feedback.expire() {
                    EventResult::Continue
                } else {
                    EventResult::Unchanged
                }
            }
            DataEvent::RefreshTick => self.request_refresh(),
            DataEvent::RefreshCompleted(result) => {
                let cursor_key = self.cursor_row().map(JobRow::key);
                // A failure is recorded by the dashboard and shown in the status bar
                if self.dashboard.complete_refresh(result).is_ok() {
                    self.rebuild_order();
                    if let Some(key) = cursor_key {
                        self.move_cursor_to(&key);
                    }
                    if self.dashboard.selection().is_none() {
                        self.log_pane.follow();
                    }
                }
                EventResult::Continue
            }
            DataEvent::ClipboardResult { success, message } => {
                self.feedback.set_clipboard_feedback(if success {
                    ClipboardFeedback::success(message)
                } else {
                    ClipboardFeedback::failure(message)
                });
                EventResult::Continue
            }
        }
    }

    /// Called by the runtime when a started refresh could not be handed to the worker.
    pub fn refresh_dispatch_failed(&mut self) {
        self.dashboard
            .abort_refresh("refresh worker is not running");
    }

    // ------------------------------------------------------------------
    // Table helpers
    // ------------------------------------------------------------------

    fn rebuild_order(&mut self) {
        self.order = self.jobs_view.sorted_indices(self.dashboard.index().rows());
        self.jobs_view.list_state.clamp(self.order.len());
    }

    fn move_cursor_to(&mut self, key: &JobKey) {
        let rows = self.dashboard.index().rows();
        if let Some(pos) = self.order.iter().position(|&i| rows[i].key() == *key) {
            self.jobs_view.list_state.selected = pos;
        }
    }

    /// Rows in display order.
    pub fn display_rows(&self) -> impl Iterator<Item = &JobRow> {
        let rows = self.dashboard.index().rows();
        self.order.iter().map(move |&i| &rows[i])
    }

    /// Row under the table cursor.
    #[must_use]
    pub fn cursor_row(&self) -> Option<&JobRow> {
        self.order
            .get(self.jobs_view.list_state.selected)
            .map(|&i| &self.dashboard.index().rows()[i])
    }

    fn select_cursor_job(&mut self) {
        let Some(key) = self.cursor_row().map(JobRow::key) else {
            return;
        };
        if self.dashboard.select(&key).is_ok() {
            self.log_pane.follow();
        }
    }

    /// The pane currently shown in the log area.
    #[must_use]
    pub fn current_pane(&self) -> &LogPane {
        self.dashboard.view().pane(self.log_pane.stream)
    }

    fn layout(&self) -> DashboardLayout {
        let (width, height) = self.terminal_size;
        DashboardLayout::new(Rect::new(0, 0, width, height))
    }

    /// Log lines visible inside the pane borders.
    fn log_body_height(&self) -> usize {
        self.layout().logs.height.saturating_sub(2) as usize
    }

    /// Lines per PgUp/PgDn: half the visible log height.
    fn log_page_size(&self) -> usize {
        (self.log_body_height() / 2).max(1)
    }

    // ------------------------------------------------------------------
    // Mouse
    // ------------------------------------------------------------------

    fn handle_mouse_click(&mut self, row: u16, column: u16) -> EventResult {
        if self.modal.is_active() {
            return EventResult::Unchanged;
        }

        let layout = self.layout();
        let Some(display_idx) = layout.table_row_at(row, column) else {
            return EventResult::Unchanged;
        };
        let offset = crate::tui::ui::table_scroll_offset(
            self.jobs_view.list_state.selected,
            layout.table_body_height(),
            self.order.len(),
        );
        let target = offset + display_idx;
        if target >= self.order.len() {
            return EventResult::Unchanged;
        }

        self.jobs_view.list_state.selected = target;
        self.select_cursor_job();
        EventResult::Continue
    }

    fn handle_mouse_scroll(&mut self, row: u16, up: bool) -> EventResult {
        if self.modal.is_active() {
            return EventResult::Unchanged;
        }

        let layout = self.layout();
        if layout.logs.contains(Position::new(layout.logs.x, row)) {
            if up {
                let total = self.current_pane().content.line_count();
                self.log_pane
                    .scroll_up(WHEEL_LINES, total, self.log_body_height());
            } else {
                self.log_pane.scroll_down(WHEEL_LINES);
            }
        } else if up {
            self.jobs_view.list_state.move_up();
        } else {
            self.jobs_view.list_state.move_down(self.order.len());
        }
        EventResult::Continue
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    /// Copy the path of the visible log file to the system clipboard.
    fn yank_current_path(&mut self) {
        if !self.config.behavior.copy_to_clipboard {
            self.feedback.set_clipboard_feedback(ClipboardFeedback::failure(
                "Clipboard disabled in config".to_string(),
            ));
            return;
        }

        let Some(path) = self.current_pane().path.as_ref() else {
            self.feedback.set_clipboard_feedback(ClipboardFeedback::failure(
                "No log file selected".to_string(),
            ));
            return;
        };

        let text = path.display().to_string();
        let tx = self.data_tx.clone();
        // Clipboard backends may block (X11 round-trips), keep them off the event loop
        std::thread::spawn(move || {
            let event = match copy_to_clipboard(&text) {
                Ok(()) => DataEvent::ClipboardResult {
                    success: true,
                    message: format!("Copied: {}", text),
                },
                Err(e) => {
                    tracing::warn!("clipboard copy failed: {e}");
                    DataEvent::ClipboardResult {
                        success: false,
                        message: "Failed to copy (no clipboard)".to_string(),
                    }
                }
            };
            if tx.try_send(event).is_err() {
                tracing::warn!("clipboard: channel closed");
            }
        });
    }
}

/// Copy text to the system clipboard.
///
/// Tries arboard first, then the usual command-line tools (useful over SSH
/// with X forwarding or on Wayland without a portal).
fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let arboard_error = match arboard::Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_text(text.to_string()) {
            Ok(()) => return Ok(()),
            Err(e) => e.to_string(),
        },
        Err(e) => e.to_string(),
    };

    let clipboard_commands: [(&str, &[&str]); 3] = [
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
        ("xsel", &["--clipboard", "--input"]),
    ];

    for (cmd, args) in clipboard_commands {
        if let Ok(mut child) = std::process::Command::new(cmd)
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            && let Some(mut stdin) = child.stdin.take()
        {
            use std::io::Write;
            if stdin.write_all(text.as_bytes()).is_ok() {
                drop(stdin);
                if let Ok(status) = child.wait()
                    && status.success()
                {
                    return Ok(());
                }
            }
        }
    }

    Err(arboard_error)
}
