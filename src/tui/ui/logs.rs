//! Log pane rendering

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::dashboard::{LogContent, LogStream};
use crate::formatting::truncate_path;
use crate::tui::app::App;
use crate::tui::theme::Theme;

pub fn render_log_pane(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let pane = app.current_pane();

    // Title: stream tabs on the left, path after, node/scroll info on the right
    let max_title = (area.width as usize).saturating_sub(40).max(10);
    let mut title = vec![Span::raw(" ")];
    for stream in [LogStream::Stdout, LogStream::Stderr] {
        let style = if stream == app.log_pane.stream {
            Style::new()
                .fg(theme.selected_fg)
                .bg(theme.selected_bg)
                .bold()
        } else {
            Style::default().fg(theme.border)
        };
        title.push(Span::styled(format!(" {} ", stream.label()), style));
    }
    title.push(Span::raw(" "));
    title.push(Span::raw(truncate_path(&pane.title(), max_title)));
    title.push(Span::raw(" "));

    let mut right = Vec::new();
    if let Some(selection) = app.dashboard.selection()
        && selection.is_multi_node()
    {
        right.push(Span::styled(
            format!(" node {}/{} ", selection.node + 1, selection.node_count),
            Style::default().fg(theme.accent).bold(),
        ));
    }
    if !pane.content.is_placeholder() && !app.log_pane.is_following() {
        right.push(Span::styled(
            format!(" -{} ", app.log_pane.back),
            Style::default().fg(theme.warn),
        ));
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Line::from(title))
        .title(Line::from(right).right_aligned());

    if let LogContent::Lines { dropped, .. } = &pane.content
        && *dropped > 0
    {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" {} earlier lines not loaded ", dropped),
                Style::default().fg(theme.placeholder),
            ))
            .right_aligned(),
        );
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = match &pane.content {
        LogContent::Placeholder(message) => Paragraph::new(message.as_str())
            .style(Style::default().fg(theme.placeholder).italic()),
        LogContent::Lines { lines, .. } => {
            let height = inner.height as usize;
            let start = app.log_pane.first_visible_line(lines.len(), height);
            let visible: Vec<Line> = lines
                .iter()
                .skip(start)
                .take(height)
                .map(|line| Line::raw(line.as_str()))
                .collect();
            Paragraph::new(visible).style(Style::default().fg(theme.fg))
        }
    };

    frame.render_widget(paragraph, inner);
}
