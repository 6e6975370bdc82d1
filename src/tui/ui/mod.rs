//! UI rendering for the TUI
//!
//! This module handles all rendering using ratatui. The rendering is event-driven -
//! we only render when an event triggers a state change, not at a fixed frame rate.
//!
//! The screen is a fixed stack: header line, jobs table, log pane, status bar.
//! [`DashboardLayout`] is shared with the app so mouse hit-testing agrees with
//! what was drawn.

mod jobs;
mod logs;
mod overlays;
mod widgets;

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::dashboard::Phase;
use crate::tui::app::{App, JobSortColumn, ModalState};
use crate::tui::theme::Theme;

use jobs::render_jobs_table;
use logs::render_log_pane;
use overlays::{render_clipboard_toast, render_help_overlay, render_sort_menu};

pub use widgets::calculate_scroll_offset as table_scroll_offset;

/// Screen regions of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLayout {
    pub header: Rect,
    pub table: Rect,
    pub logs: Rect,
    pub status: Rect,
}

impl DashboardLayout {
    pub fn new(area: Rect) -> Self {
        let layout = Layout::vertical([
            Constraint::Length(1),      // Header
            Constraint::Percentage(40), // Jobs table
            Constraint::Min(3),         // Log pane
            Constraint::Length(2),      // Status bar
        ])
        .split(area);

        Self {
            header: layout[0],
            table: layout[1],
            logs: layout[2],
            status: layout[3],
        }
    }

    /// Visible data rows of the table (borders and column header excluded).
    pub fn table_body_height(&self) -> usize {
        self.table.height.saturating_sub(3) as usize
    }

    /// Index of the visible table row at a screen position, if any.
    pub fn table_row_at(&self, row: u16, column: u16) -> Option<usize> {
        let first = self.table.y + 2;
        let end = (self.table.y + self.table.height).saturating_sub(1);
        let inside_x = column > self.table.x && column < self.table.x + self.table.width;
        if inside_x && row >= first && row < end {
            Some((row - first) as usize)
        } else {
            None
        }
    }
}

/// Render the entire TUI
pub fn render(app: &App, theme: &Theme, frame: &mut Frame) {
    let area = frame.area();
    let layout = DashboardLayout::new(area);

    render_header(app, frame, layout.header, theme);
    render_jobs_table(app, frame, layout.table, theme);
    render_log_pane(app, frame, layout.logs, theme);
    render_status_bar(app, frame, layout.status, theme);

    match &app.modal {
        ModalState::Help => render_help_overlay(frame, area, theme),
        ModalState::Sort { .. } => render_sort_menu(app, frame, area, theme),
        ModalState::None => {}
    }

    // Clipboard feedback toast (always on top)
    if let Some(feedback) = app.feedback.current_clipboard_feedback() {
        render_clipboard_toast(feedback, frame, area, theme);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let index = app.dashboard.index();
    let mut parts = vec![
        Span::styled(" sqdash ", Style::default().fg(theme.accent).bold()),
        Span::styled(
            format!("| {} ", app.source_label),
            Style::default().fg(theme.border),
        ),
        Span::raw("| "),
        Span::raw(format!("{} jobs, ", index.len())),
        Span::styled(
            format!("{} started", index.started_count()),
            Style::default().fg(theme.running),
        ),
    ];

    if let Some(row) = app.dashboard.selected_row() {
        parts.push(Span::raw(" | viewing "));
        parts.push(Span::styled(
            format!("{} {}", row.key(), row.name),
            Style::default().fg(theme.accent),
        ));
    }

    if app.dashboard.is_refreshing() {
        parts.push(Span::styled(
            " | Refreshing...",
            Style::default().fg(theme.pending),
        ));
    } else if app.config.refresh.auto_interval > 0 {
        parts.push(Span::styled(
            format!(" | auto {}s", app.config.refresh.auto_interval),
            Style::default().fg(theme.border),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let layout = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(area);

    let keybinds = match &app.modal {
        ModalState::Sort { .. } => " j/k:move  Enter:apply  Esc:cancel ",
        ModalState::Help => " ?/Esc:close  q:quit ",
        ModalState::None => {
            " j/k:move  Enter:open  Tab:stdout/stderr  n/p:node  PgUp/PgDn:scroll  r:refresh  s:sort  y:yank  ?:help  q:quit "
        }
    };
    let keybinds_para = Paragraph::new(keybinds).style(Style::default().fg(theme.border));
    frame.render_widget(keybinds_para, layout[0]);

    let mut status_parts = Vec::new();

    if app.modal.sort_menu().is_some() {
        status_parts.push(Span::styled(
            " [SORT]",
            Style::default().fg(theme.warn).bold(),
        ));
    }

    // Show sort info if not default
    if app.jobs_view.sort_column != JobSortColumn::Queue || !app.jobs_view.sort_ascending {
        let dir = if app.jobs_view.sort_ascending {
            "ASC"
        } else {
            "DESC"
        };
        status_parts.push(Span::styled(
            format!(" Sort:{}/{}", app.jobs_view.sort_column.label(), dir),
            Style::default().fg(theme.accent),
        ));
    }

    // Last update time
    status_parts.push(Span::raw(" | "));
    match (app.dashboard.phase(), app.dashboard.last_refreshed()) {
        (Phase::Ready, Some(at)) => status_parts.push(Span::styled(
            format!("Updated {}", at.format("%H:%M:%S")),
            Style::default().fg(theme.border),
        )),
        _ => status_parts.push(Span::styled("Loading...", Style::default().fg(theme.pending))),
    }

    // Config warnings display (persistent until fixed)
    if let Some(first) = app.feedback.config_warnings.first() {
        let warning_text = if app.feedback.config_warnings.len() == 1 {
            format!(" | WARN: {}", first)
        } else {
            format!(
                " | WARN: {} (+{} more)",
                first,
                app.feedback.config_warnings.len() - 1
            )
        };
        status_parts.push(Span::styled(warning_text, Style::default().fg(theme.warn)));
    }

    // Last refresh or selection error, until the next success or Esc
    if let Some(error) = app.dashboard.last_error() {
        status_parts.push(Span::styled(
            format!(" | ERROR: {} ", error),
            Style::default().fg(theme.failed),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(status_parts)), layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_stacks_regions() {
        let layout = DashboardLayout::new(Rect::new(0, 0, 100, 50));
        assert_eq!(layout.header.y, 0);
        assert_eq!(layout.table.y, 1);
        assert_eq!(layout.logs.y, layout.table.y + layout.table.height);
        assert_eq!(layout.status.height, 2);
        assert_eq!(layout.status.y + layout.status.height, 50);
    }

    #[test]
    fn test_table_row_hit_testing() {
        let layout = DashboardLayout::new(Rect::new(0, 0, 100, 50));
        // Border and column header are not rows
        assert_eq!(layout.table_row_at(layout.table.y, 10), None);
        assert_eq!(layout.table_row_at(layout.table.y + 1, 10), None);
        assert_eq!(layout.table_row_at(layout.table.y + 2, 10), Some(0));
        assert_eq!(layout.table_row_at(layout.table.y + 4, 10), Some(2));
        // Outside horizontally or below the table
        assert_eq!(layout.table_row_at(layout.table.y + 2, 0), None);
        assert_eq!(layout.table_row_at(layout.logs.y + 1, 10), None);
    }

    #[test]
    fn test_render_shows_jobs_and_placeholder() {
        use crate::dashboard::Dashboard;
        use crate::models::{DashConfig, JobIndex};
        use crate::parser::parse;
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let lines = [
            "HEADER",
            "77|77|N/A|debug|render-me|PENDING|0:00|1|(None)|/x/%j.out|/x/%j.err",
        ];
        let index = JobIndex::build(parse(&lines).unwrap()).unwrap();
        let mut dashboard = Dashboard::new(0);
        assert!(dashboard.begin_refresh());
        dashboard.complete_refresh(Ok(index)).unwrap();

        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        let mut app = App::new(
            dashboard,
            DashConfig::default(),
            Vec::new(),
            "test".into(),
            tx,
        );
        app.terminal_size = (120, 30);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let theme = Theme::dark();
        terminal.draw(|frame| render(&app, &theme, frame)).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("render-me"));
        assert!(screen.contains("No Log File Selected"));
        assert!(screen.contains("Updated"));
    }
}
