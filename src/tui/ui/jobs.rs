//! Jobs table rendering

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::dashboard::Phase;
use crate::formatting::truncate_string;
use crate::models::{JobKey, JobRow};
use crate::tui::app::App;
use crate::tui::theme::Theme;

use super::widgets::{calculate_scroll_offset, create_table_header};

pub fn render_jobs_table(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let title = format!(" Jobs ({}) ", app.order.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.order.is_empty() {
        let msg = if app.dashboard.phase() == Phase::Loading {
            "Loading jobs..."
        } else {
            "No jobs in the queue"
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(theme.border))
            .alignment(Alignment::Center);
        frame.render_widget(para, inner);
        return;
    }

    let header = create_table_header(&JobRow::DISPLAY_COLUMNS, theme);

    let available_height = inner.height.saturating_sub(1) as usize; // -1 for header
    let selected = app.jobs_view.list_state.selected;
    let scroll_offset = calculate_scroll_offset(selected, available_height, app.order.len());
    let viewed = app.dashboard.selection().map(|s| &s.key);
    let name_width = app.config.display.job_name_max_length;

    let rows: Vec<Row> = app
        .display_rows()
        .enumerate()
        .skip(scroll_offset)
        .take(available_height)
        .map(|(display_idx, job)| {
            job_to_row(job, display_idx == selected, viewed, name_width, theme)
        })
        .collect();

    let widths = [
        Constraint::Length(10), // JobID
        Constraint::Length(11), // ArrayJobID
        Constraint::Length(11), // ArrayTaskID
        Constraint::Length(10), // Partition
        Constraint::Min(12),    // Name
        Constraint::Length(11), // State
        Constraint::Length(11), // TimeUsed
        Constraint::Length(5),  // Nodes
        Constraint::Length(16), // NodeList
    ];

    let table = Table::new(rows, widths).header(header);
    frame.render_widget(table, inner);
}

fn job_to_row<'a>(
    job: &'a JobRow,
    is_cursor: bool,
    viewed: Option<&JobKey>,
    name_width: usize,
    theme: &Theme,
) -> Row<'a> {
    let state_color = theme.job_state_color(job.job_state());
    let [
        job_id,
        array_job_id,
        array_task_id,
        partition,
        name,
        state,
        time_used,
        nodes,
        nodelist,
    ] = job.display_fields();

    // Marker for the job whose logs are open
    let is_viewed = viewed.is_some_and(|key| *key == job.key());
    let id_cell = if is_viewed {
        Cell::from(format!("> {}", job_id))
            .style(Style::default().fg(theme.accent).bold())
    } else {
        Cell::from(job_id)
    };

    let cells = vec![
        id_cell,
        Cell::from(array_job_id),
        Cell::from(array_task_id),
        Cell::from(partition),
        Cell::from(truncate_string(&name, name_width)),
        Cell::from(state).style(Style::default().fg(state_color)),
        Cell::from(time_used),
        Cell::from(nodes),
        Cell::from(nodelist),
    ];

    let row = Row::new(cells);
    if is_cursor {
        row.style(Style::new().bg(theme.selected_bg).fg(theme.selected_fg))
    } else {
        row
    }
}
