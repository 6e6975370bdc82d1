//! Application state types for the TUI
//!
//! This module contains the state management types:
//! - Modal states (Help, Sort)
//! - Table selection and navigation state (ListState, JobsViewState)
//! - Log pane scroll state
//! - Feedback state for config warnings and clipboard notifications

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use crate::dashboard::LogStream;
use crate::formatting::parse_squeue_duration;
use crate::models::JobRow;

// ============================================================================
// Sort Menu State
// ============================================================================

/// Sort column for the jobs table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobSortColumn {
    /// Order squeue printed the rows in
    #[default]
    Queue,
    JobId,
    Partition,
    Name,
    State,
    TimeUsed,
    Nodes,
}

impl JobSortColumn {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Queue => "Queue order",
            Self::JobId => "Job ID",
            Self::Partition => "Partition",
            Self::Name => "Name",
            Self::State => "State",
            Self::TimeUsed => "Time used",
            Self::Nodes => "Nodes",
        }
    }

    /// Compare two rows on this column (ascending).
    fn compare(self, a: &JobRow, b: &JobRow) -> Ordering {
        match self {
            Self::Queue => Ordering::Equal,
            Self::JobId => compare_numeric_id(&a.array_job_id, &b.array_job_id)
                .then_with(|| compare_numeric_id(&a.array_task_id, &b.array_task_id)),
            Self::Partition => compare_by(a, b, |job| job.partition.to_lowercase()),
            Self::Name => compare_by(a, b, |job| job.name.to_lowercase()),
            Self::State => compare_by(a, b, |job| job.job_state().sort_rank()),
            Self::TimeUsed => compare_by(a, b, |job| parse_squeue_duration(&job.time_used)),
            Self::Nodes => a.num_nodes.cmp(&b.num_nodes),
        }
    }
}

/// Numeric ids sort numerically, anything else (e.g. `N/A`) after them.
fn compare_by<K: Ord>(a: &JobRow, b: &JobRow, key: impl Fn(&JobRow) -> K) -> Ordering {
    key(a).cmp(&key(b))
}

fn compare_numeric_id(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Sort menu state
#[derive(Debug)]
pub struct SortMenuState {
    pub selected: usize,
    pub columns: Vec<JobSortColumn>,
}

impl Default for SortMenuState {
    fn default() -> Self {
        Self::new()
    }
}

impl SortMenuState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            columns: vec![
                JobSortColumn::Queue,
                JobSortColumn::JobId,
                JobSortColumn::Partition,
                JobSortColumn::Name,
                JobSortColumn::State,
                JobSortColumn::TimeUsed,
                JobSortColumn::Nodes,
            ],
        }
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.selected < self.columns.len().saturating_sub(1) {
            self.selected += 1;
        }
    }

    #[must_use]
    pub fn selected_column(&self) -> Option<JobSortColumn> {
        self.columns.get(self.selected).copied()
    }
}

// ============================================================================
// Clipboard Feedback
// ============================================================================

/// Clipboard operation result for visual feedback
#[derive(Debug, Clone)]
pub struct ClipboardFeedback {
    pub message: String,
    pub success: bool,
    pub timestamp: Instant,
}

impl ClipboardFeedback {
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
            timestamp: Instant::now(),
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
            timestamp: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.timestamp.elapsed() < Duration::from_secs(2)
    }
}

// ============================================================================
// List Navigation State
// ============================================================================

/// Cursor position within the jobs table
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub selected: usize,
}

impl ListState {
    pub fn clamp(&mut self, list_len: usize) {
        self.selected = if list_len == 0 {
            0
        } else {
            self.selected.min(list_len - 1)
        };
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self, list_len: usize) {
        if list_len > 0 && self.selected < list_len - 1 {
            self.selected += 1;
        }
    }

    pub fn move_to_top(&mut self) {
        self.selected = 0;
    }
}

// ============================================================================
// Per-View State Types
// ============================================================================

/// Jobs table state: cursor plus sort order
#[derive(Debug)]
pub struct JobsViewState {
    pub list_state: ListState,
    pub sort_column: JobSortColumn,
    pub sort_ascending: bool,
}

impl Default for JobsViewState {
    fn default() -> Self {
        Self {
            list_state: ListState::default(),
            sort_column: JobSortColumn::Queue,
            sort_ascending: true,
        }
    }
}

impl JobsViewState {
    /// Pick a sort column; choosing the current one flips the direction.
    pub fn apply_sort(&mut self, column: JobSortColumn) {
        if self.sort_column == column {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_column = column;
            self.sort_ascending = true;
        }
    }

    /// Positions into `rows` in display order.
    ///
    /// The sort is stable, so ties (and `Queue`) keep squeue order.
    #[must_use]
    pub fn sorted_indices(&self, rows: &[JobRow]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        let column = self.sort_column;
        let ascending = self.sort_ascending;

        indices.sort_by(|&a, &b| {
            let cmp = column.compare(&rows[a], &rows[b]);
            if ascending { cmp } else { cmp.reverse() }
        });

        indices
    }
}

/// Scroll state of the log pane.
///
/// `back` counts lines above the tail; 0 means the pane follows the end.
#[derive(Debug, Clone, Default)]
pub struct LogPaneState {
    pub stream: LogStream,
    pub back: usize,
}

impl LogPaneState {
    #[must_use]
    pub fn is_following(&self) -> bool {
        self.back == 0
    }

    /// Scroll towards the start, stopping once the first line is at the top
    /// of a pane `height` lines tall.
    pub fn scroll_up(&mut self, lines: usize, total_lines: usize, height: usize) {
        self.back = self
            .back
            .saturating_add(lines)
            .min(total_lines.saturating_sub(height));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.back = self.back.saturating_sub(lines);
    }

    pub fn follow(&mut self) {
        self.back = 0;
    }

    pub fn switch_stream(&mut self) {
        self.stream = self.stream.toggle();
        self.back = 0;
    }

    /// First line to draw for a pane `height` lines tall.
    #[must_use]
    pub fn first_visible_line(&self, total_lines: usize, height: usize) -> usize {
        total_lines
            .saturating_sub(height)
            .saturating_sub(self.back)
    }
}

// ============================================================================
// Modal State
// ============================================================================

/// Modal overlay state - only one modal can be active at a time.
#[derive(Debug, Default)]
pub enum ModalState {
    #[default]
    None,
    Help,
    Sort {
        menu: SortMenuState,
    },
}

impl ModalState {
    /// Check if any modal is currently active
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, ModalState::None)
    }

    /// Get the sort menu if in sort mode
    #[must_use]
    pub fn sort_menu(&self) -> Option<&SortMenuState> {
        match self {
            ModalState::Sort { menu } => Some(menu),
            _ => None,
        }
    }

    /// Get mutable reference to sort menu
    #[must_use]
    pub fn sort_menu_mut(&mut self) -> Option<&mut SortMenuState> {
        match self {
            ModalState::Sort { menu } => Some(menu),
            _ => None,
        }
    }
}

// ============================================================================
// Feedback State
// ============================================================================

/// Config warnings and transient messages
#[derive(Debug)]
pub struct FeedbackState {
    pub config_warnings: Vec<String>,
    clipboard_feedback: Option<ClipboardFeedback>,
}

impl FeedbackState {
    /// Create a new FeedbackState with config warnings
    pub fn new(config_warnings: Vec<String>) -> Self {
        Self {
            config_warnings,
            clipboard_feedback: None,
        }
    }

    /// Set clipboard operation feedback
    pub fn set_clipboard_feedback(&mut self, feedback: ClipboardFeedback) {
        self.clipboard_feedback = Some(feedback);
    }

    /// Get current clipboard feedback if visible
    #[must_use]
    pub fn current_clipboard_feedback(&self) -> Option<&ClipboardFeedback> {
        self.clipboard_feedback.as_ref().filter(|f| f.is_visible())
    }

    /// Drop messages whose display time is over. Returns true if anything changed.
    pub fn expire(&mut self) -> bool {
        if self
            .clipboard_feedback
            .as_ref()
            .is_some_and(|f| !f.is_visible())
        {
            self.clipboard_feedback = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_row;

    fn row(line: &str) -> JobRow {
        parse_row(2, line).unwrap()
    }

    fn sample_rows() -> Vec<JobRow> {
        vec![
            row("30|30|N/A|gpu|zeta|PENDING|0:00|1|(None)|a|b"),
            row("9|9|N/A|cpu|Alpha|RUNNING|1:02:03|4|n[1-4]|a|b"),
            row("101|100|1|debug|beta|COMPLETING|59:59|2|n[5-6]|a|b"),
        ]
    }

    #[test]
    fn test_list_state_navigation() {
        let mut state = ListState::default();
        state.move_down(3);
        state.move_down(3);
        state.move_down(3);
        assert_eq!(state.selected, 2);

        state.move_up();
        assert_eq!(state.selected, 1);

        state.clamp(1);
        assert_eq!(state.selected, 0);
        state.move_up();
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_queue_order_is_default() {
        let view = JobsViewState::default();
        assert_eq!(view.sorted_indices(&sample_rows()), vec![0, 1, 2]);
    }

    #[test]
    fn test_sort_by_job_id_numeric() {
        let mut view = JobsViewState::default();
        view.apply_sort(JobSortColumn::JobId);
        assert_eq!(view.sorted_indices(&sample_rows()), vec![1, 0, 2]);

        // Same column again flips direction
        view.apply_sort(JobSortColumn::JobId);
        assert!(!view.sort_ascending);
        assert_eq!(view.sorted_indices(&sample_rows()), vec![2, 0, 1]);
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let mut view = JobsViewState::default();
        view.apply_sort(JobSortColumn::Name);
        assert_eq!(view.sorted_indices(&sample_rows()), vec![1, 2, 0]);
    }

    #[test]
    fn test_sort_by_state_and_time() {
        let mut view = JobsViewState::default();
        view.apply_sort(JobSortColumn::State);
        assert_eq!(view.sorted_indices(&sample_rows()), vec![1, 2, 0]);

        view.apply_sort(JobSortColumn::TimeUsed);
        assert_eq!(view.sorted_indices(&sample_rows()), vec![0, 2, 1]);
    }

    #[test]
    fn test_sort_menu_bounds() {
        let mut menu = SortMenuState::new();
        menu.move_up();
        assert_eq!(menu.selected_column(), Some(JobSortColumn::Queue));
        for _ in 0..20 {
            menu.move_down();
        }
        assert_eq!(menu.selected_column(), Some(JobSortColumn::Nodes));
    }

    #[test]
    fn test_log_pane_scrolling() {
        let mut pane = LogPaneState::default();
        assert!(pane.is_following());
        assert_eq!(pane.first_visible_line(100, 10), 90);

        pane.scroll_up(25, 100, 10);
        assert_eq!(pane.first_visible_line(100, 10), 65);

        pane.scroll_up(1000, 100, 10);
        assert_eq!(pane.back, 90);
        assert_eq!(pane.first_visible_line(100, 10), 0);

        pane.scroll_down(5);
        assert_eq!(pane.first_visible_line(100, 10), 5);

        pane.scroll_down(1000);
        assert!(pane.is_following());

        // Everything fits: nothing to scroll
        pane.scroll_up(3, 8, 10);
        assert!(pane.is_following());

        pane.scroll_up(5, 100, 10);
        pane.switch_stream();
        assert_eq!(pane.stream, LogStream::Stderr);
        assert!(pane.is_following());
    }

    #[test]
    fn test_clipboard_feedback_visible() {
        let mut feedback = FeedbackState::new(Vec::new());
        assert!(feedback.current_clipboard_feedback().is_none());
        assert!(!feedback.expire());

        feedback.set_clipboard_feedback(ClipboardFeedback::success("copied".to_string()));
        assert!(feedback.current_clipboard_feedback().is_some());
        assert!(!feedback.expire());
    }
}
