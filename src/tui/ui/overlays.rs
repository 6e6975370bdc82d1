//! Overlay rendering (help, sort menu, clipboard toast)

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, ClipboardFeedback};
use crate::tui::theme::Theme;

use super::widgets::centered_rect;

fn section(title: &'static str, theme: &Theme) -> Line<'static> {
    Line::from(vec![Span::styled(
        title,
        Style::default().fg(theme.accent).bold(),
    )])
}

pub fn render_help_overlay(frame: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(60, 80, area);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "sqdash - Keyboard Shortcuts",
            Style::default().bold(),
        )]),
        Line::from(""),
        section("Jobs", theme),
        Line::from("  j / Down       Move cursor down"),
        Line::from("  k / Up         Move cursor up"),
        Line::from("  g / Home       Jump to top"),
        Line::from("  Enter          Show logs of the job under the cursor"),
        Line::from("  s              Open sort menu"),
        Line::from("  Mouse click    Show logs of the clicked job"),
        Line::from(""),
        section("Logs", theme),
        Line::from("  Tab            Switch between stdout and stderr"),
        Line::from("  n / ]          Next node"),
        Line::from("  p / [          Previous node"),
        Line::from("  Ctrl+u / PgUp  Scroll up"),
        Line::from("  Ctrl+d / PgDn  Scroll down"),
        Line::from("  G / End        Follow the end of the file"),
        Line::from("  l              Reload log files"),
        Line::from("  y              Copy log file path to clipboard"),
        Line::from(""),
        section("General", theme),
        Line::from("  r              Refresh the queue"),
        Line::from("  ?/F1           Show this help"),
        Line::from("  Esc            Close overlay / dismiss error"),
        Line::from("  q              Quit application"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press ? or Esc to close this help",
            Style::default().fg(theme.border),
        )]),
    ];

    let help_para = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_focused))
                .title(" Help "),
        )
        .style(Style::default().fg(theme.fg));

    frame.render_widget(help_para, popup_area);
}

pub fn render_sort_menu(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(30, 50, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(" Sort By ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let Some(sort_menu) = app.modal.sort_menu() else {
        return;
    };

    let mut lines = vec![Line::from("")];

    for (i, column) in sort_menu.columns.iter().enumerate() {
        let is_selected = i == sort_menu.selected;
        let is_current = *column == app.jobs_view.sort_column;

        let prefix = if is_selected { "> " } else { "  " };
        let suffix = match (is_current, app.jobs_view.sort_ascending) {
            (true, true) => " [ASC]",
            (true, false) => " [DESC]",
            (false, _) => "",
        };

        let style = if is_selected {
            Style::default().fg(theme.selected_fg).bg(theme.selected_bg)
        } else if is_current {
            Style::default().fg(theme.accent)
        } else {
            Style::default()
        };

        lines.push(Line::from(Span::styled(
            format!("{}{}{}", prefix, column.label(), suffix),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![Span::styled(
        "  [Enter] Select  [Esc] Cancel",
        Style::default().fg(theme.border),
    )]));

    let para = Paragraph::new(lines).style(Style::default().fg(theme.fg));
    frame.render_widget(para, inner);
}

pub fn render_clipboard_toast(
    feedback: &ClipboardFeedback,
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
) {
    // Position toast at bottom-right, above the status bar
    let toast_width = ((feedback.message.chars().count() + 4).min(60) as u16).min(area.width);
    let toast_area = Rect {
        x: area.width.saturating_sub(toast_width + 2),
        y: area.height.saturating_sub(5),
        width: toast_width,
        height: 3.min(area.height),
    };

    frame.render_widget(Clear, toast_area);

    let border_color = if feedback.success {
        theme.running
    } else {
        theme.failed
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let para = Paragraph::new(format!(" {} ", feedback.message))
        .block(block)
        .style(Style::default().fg(theme.fg))
        .alignment(Alignment::Center);

    frame.render_widget(para, toast_area);
}
