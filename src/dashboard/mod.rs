//! Dashboard controller.
//!
//! Owns the current [`JobIndex`], the viewer selection and the refresh
//! bookkeeping. It is plain synchronous state: the TUI runtime runs the
//! blocking fetch elsewhere and hands the outcome to [`Dashboard::complete_refresh`].

pub mod viewer;

use chrono::{DateTime, Local};

use crate::error::{DashboardError, RefreshError};
use crate::models::{JobIndex, JobKey, JobRow};
use crate::parser;
use crate::slurm::QueueSource;

pub use viewer::{LogContent, LogPane, LogStream, LogView, NodeDirection, ViewerSelection};

/// Run one fetch, parse and index cycle against `source`.
pub fn load_index(source: &dyn QueueSource) -> Result<JobIndex, RefreshError> {
    let raw_lines = source.fetch()?;
    let rows = parser::parse(&raw_lines)?;
    Ok(JobIndex::build(rows)?)
}

/// Coarse lifecycle of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No snapshot has been loaded yet.
    Loading,
    /// At least one snapshot is available.
    Ready,
}

#[derive(Debug)]
pub struct Dashboard {
    phase: Phase,
    index: JobIndex,
    selection: Option<ViewerSelection>,
    view: LogView,
    refreshing: bool,
    last_error: Option<String>,
    last_refreshed: Option<DateTime<Local>>,
    max_log_lines: usize,
    quit: bool,
}

impl Dashboard {
    /// `max_log_lines` of 0 shows whole log files.
    #[must_use]
    pub fn new(max_log_lines: usize) -> Self {
        Self {
            phase: Phase::Loading,
            index: JobIndex::default(),
            selection: None,
            view: LogView::default(),
            refreshing: false,
            last_error: None,
            last_refreshed: None,
            max_log_lines,
            quit: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn index(&self) -> &JobIndex {
        &self.index
    }

    #[must_use]
    pub fn selection(&self) -> Option<&ViewerSelection> {
        self.selection.as_ref()
    }

    /// Row of the selected job, if any.
    #[must_use]
    pub fn selected_row(&self) -> Option<&JobRow> {
        self.selection
            .as_ref()
            .and_then(|selection| self.index.get(&selection.key))
    }

    #[must_use]
    pub fn view(&self) -> &LogView {
        &self.view
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Message of the most recent failure, cleared by the next successful refresh.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    #[must_use]
    pub fn last_refreshed(&self) -> Option<DateTime<Local>> {
        self.last_refreshed
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn quit(&mut self) {
        self.quit = true;
    }

    /// Mark a refresh as in flight.
    ///
    /// Returns false when one already is; the caller must then drop the trigger.
    pub fn begin_refresh(&mut self) -> bool {
        if self.refreshing {
            tracing::debug!("refresh already in flight, ignoring trigger");
            return false;
        }
        self.refreshing = true;
        true
    }

    /// Drop the in-flight mark without a result (the worker could not be reached).
    pub fn abort_refresh(&mut self, reason: &str) {
        tracing::warn!(reason, "refresh aborted");
        self.refreshing = false;
        self.last_error = Some(reason.to_string());
    }

    /// Apply the outcome of a refresh started with [`begin_refresh`](Self::begin_refresh).
    ///
    /// On success the index is replaced and the selection is kept when its key
    /// survived. On failure index and selection are left exactly as they were.
    pub fn complete_refresh(
        &mut self,
        result: Result<JobIndex, RefreshError>,
    ) -> Result<(), RefreshError> {
        self.refreshing = false;
        match result {
            Ok(index) => {
                tracing::info!(jobs = index.len(), "queue snapshot refreshed");
                self.index = index;
                self.phase = Phase::Ready;
                self.last_error = None;
                self.last_refreshed = Some(Local::now());
                self.reconcile_selection();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "refresh failed");
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Fetch, parse and index synchronously.
    ///
    /// A no-op returning `Ok` when a refresh is already in flight.
    pub fn refresh_with(&mut self, source: &dyn QueueSource) -> Result<(), RefreshError> {
        if !self.begin_refresh() {
            return Ok(());
        }
        let result = load_index(source);
        self.complete_refresh(result)
    }

    fn reconcile_selection(&mut self) {
        let Some(selection) = self.selection.as_mut() else {
            return;
        };
        match self.index.get(&selection.key) {
            Some(row) => {
                selection.rebase(row);
                self.view = LogView::resolve(row, selection.node, self.max_log_lines);
            }
            None => {
                tracing::debug!(key = %selection.key, "selected job left the queue");
                self.clear_selection();
            }
        }
    }

    /// Select a job and show the logs of its first node.
    ///
    /// An unknown key clears the selection and records the error.
    pub fn select(&mut self, key: &JobKey) -> Result<(), DashboardError> {
        let Some(row) = self.index.get(key) else {
            let err = DashboardError::UnknownKey(key.clone());
            tracing::error!(error = %err, "selection does not match the index");
            self.clear_selection();
            self.last_error = Some(err.to_string());
            return Err(err);
        };

        let selection = ViewerSelection::new(row);
        self.view = LogView::resolve(row, selection.node, self.max_log_lines);
        tracing::debug!(key = %key, nodes = selection.node_count, "job selected");
        self.selection = Some(selection);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.view = LogView::default();
    }

    pub fn next_node(&mut self) {
        self.step_node(NodeDirection::Next);
    }

    pub fn previous_node(&mut self) {
        self.step_node(NodeDirection::Previous);
    }

    fn step_node(&mut self, direction: NodeDirection) {
        let Some(selection) = self.selection.as_mut() else {
            return;
        };
        if selection.step(direction) {
            self.reload();
        }
    }

    /// Re-read the log files of the current selection.
    pub fn reload(&mut self) {
        let Some(selection) = self.selection.as_ref() else {
            return;
        };
        if let Some(row) = self.index.get(&selection.key) {
            self.view = LogView::resolve(row, selection.node, self.max_log_lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IndexError, QueryError};
    use std::path::PathBuf;
    use std::sync::Mutex;

    const HEADER: &str = "JOBID|ARRAY_JOB_ID|ARRAY_TASK_ID|PARTITION|NAME|STATE|TIME|NODES|NODELIST|STDOUT|STDERR";

    /// Queue source that replays a scripted sequence of outputs.
    struct Scripted {
        outputs: Mutex<Vec<Vec<String>>>,
    }

    impl Scripted {
        fn new(outputs: Vec<Vec<&str>>) -> Self {
            let mut outputs: Vec<Vec<String>> = outputs
                .into_iter()
                .map(|lines| lines.into_iter().map(str::to_string).collect())
                .collect();
            outputs.reverse();
            Self {
                outputs: Mutex::new(outputs),
            }
        }
    }

    impl QueueSource for Scripted {
        fn fetch(&self) -> Result<Vec<String>, QueryError> {
            self.outputs
                .lock()
                .unwrap()
                .pop()
                .ok_or(QueryError::NotFound {
                    program: PathBuf::from("squeue"),
                })
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn three_node_job() -> &'static str {
        "500|500|N/A|gpu|train|RUNNING|2:00|3|n[1-3]|/tmp/sqdash-missing/out_%n.log|/tmp/sqdash-missing/err_%n.log"
    }

    fn pending_job() -> &'static str {
        "600|600|N/A|gpu|eval|PENDING|0:00|1|(Priority)|/tmp/sqdash-missing/%j.out|/tmp/sqdash-missing/%j.err"
    }

    fn ready_dashboard() -> Dashboard {
        let source = Scripted::new(vec![vec![HEADER, three_node_job(), pending_job()]]);
        let mut dashboard = Dashboard::new(0);
        dashboard.refresh_with(&source).unwrap();
        dashboard
    }

    #[test]
    fn test_first_refresh_moves_to_ready() {
        let mut dashboard = Dashboard::new(0);
        assert_eq!(dashboard.phase(), Phase::Loading);

        let failing = Scripted::new(vec![]);
        assert!(dashboard.refresh_with(&failing).is_err());
        assert_eq!(dashboard.phase(), Phase::Loading);
        assert!(dashboard.last_error().unwrap().starts_with("squeue:"));

        let source = Scripted::new(vec![vec![HEADER, three_node_job()]]);
        dashboard.refresh_with(&source).unwrap();
        assert_eq!(dashboard.phase(), Phase::Ready);
        assert_eq!(dashboard.index().len(), 1);
        assert!(dashboard.last_error().is_none());
        assert!(dashboard.last_refreshed().is_some());
    }

    #[test]
    fn test_overlapping_refresh_is_ignored() {
        let mut dashboard = ready_dashboard();
        assert!(dashboard.begin_refresh());
        assert!(!dashboard.begin_refresh());
        assert!(dashboard.is_refreshing());

        // A synchronous refresh during an in-flight one does nothing
        let source = Scripted::new(vec![vec![HEADER]]);
        dashboard.refresh_with(&source).unwrap();
        assert_eq!(dashboard.index().len(), 2);

        dashboard.complete_refresh(Ok(JobIndex::default())).unwrap();
        assert!(!dashboard.is_refreshing());
        assert!(dashboard.begin_refresh());
    }

    #[test]
    fn test_select_and_paginate_nodes() {
        let mut dashboard = ready_dashboard();
        dashboard.select(&JobKey::new("500", "N/A")).unwrap();

        let selection = dashboard.selection().unwrap();
        assert_eq!(selection.node, 0);
        assert_eq!(selection.node_count, 3);
        assert_eq!(
            dashboard.view().stdout.path,
            Some(PathBuf::from("/tmp/sqdash-missing/out_0.log"))
        );

        dashboard.previous_node();
        assert_eq!(dashboard.selection().unwrap().node, 2);
        assert_eq!(
            dashboard.view().stderr.path,
            Some(PathBuf::from("/tmp/sqdash-missing/err_2.log"))
        );
        dashboard.next_node();
        assert_eq!(dashboard.selection().unwrap().node, 0);
    }

    #[test]
    fn test_select_pending_job() {
        let mut dashboard = ready_dashboard();
        dashboard.select(&JobKey::new("600", "N/A")).unwrap();
        assert_eq!(
            dashboard.view().stdout.content,
            LogContent::Placeholder(
                "Selected job has not started yet, is in state: PENDING".to_string()
            )
        );
        dashboard.next_node();
        assert_eq!(dashboard.selection().unwrap().node, 0);
    }

    #[test]
    fn test_select_unknown_key_clears_selection() {
        let mut dashboard = ready_dashboard();
        dashboard.select(&JobKey::new("500", "N/A")).unwrap();

        let err = dashboard.select(&JobKey::new("999", "N/A")).unwrap_err();
        assert_eq!(err, DashboardError::UnknownKey(JobKey::new("999", "N/A")));
        assert!(dashboard.selection().is_none());
        assert_eq!(dashboard.view(), &LogView::default());
        assert!(dashboard.last_error().unwrap().contains("999"));
    }

    #[test]
    fn test_malformed_refresh_keeps_previous_state() {
        let mut dashboard = ready_dashboard();
        dashboard.select(&JobKey::new("500", "N/A")).unwrap();
        dashboard.next_node();

        let index_before = dashboard.index().clone();
        let selection_before = dashboard.selection().cloned();

        let source = Scripted::new(vec![vec![HEADER, three_node_job(), "1|2|3"]]);
        let err = dashboard.refresh_with(&source).unwrap_err();
        assert!(matches!(err, RefreshError::Parse(_)));

        assert_eq!(dashboard.index(), &index_before);
        assert_eq!(dashboard.selection().cloned(), selection_before);
        assert!(dashboard.last_error().unwrap().contains("line 3"));
        assert!(!dashboard.is_refreshing());
    }

    #[test]
    fn test_duplicate_refresh_keeps_previous_index() {
        let mut dashboard = ready_dashboard();
        let index_before = dashboard.index().clone();

        let source = Scripted::new(vec![vec![HEADER, pending_job(), pending_job()]]);
        let err = dashboard.refresh_with(&source).unwrap_err();
        assert!(matches!(
            err,
            RefreshError::Index(IndexError::DuplicateKey(_))
        ));
        assert_eq!(dashboard.index(), &index_before);
    }

    #[test]
    fn test_refresh_drops_vanished_selection() {
        let source = Scripted::new(vec![
            vec![HEADER, three_node_job(), pending_job()],
            vec![HEADER, pending_job()],
        ]);
        let mut dashboard = Dashboard::new(0);
        dashboard.refresh_with(&source).unwrap();
        dashboard.select(&JobKey::new("500", "N/A")).unwrap();

        dashboard.refresh_with(&source).unwrap();
        assert!(dashboard.selection().is_none());
        assert_eq!(dashboard.view(), &LogView::default());
    }

    #[test]
    fn test_refresh_keeps_surviving_selection_and_node() {
        let source = Scripted::new(vec![
            vec![HEADER, three_node_job()],
            vec![HEADER, pending_job(), three_node_job()],
        ]);
        let mut dashboard = Dashboard::new(0);
        dashboard.refresh_with(&source).unwrap();
        dashboard.select(&JobKey::new("500", "N/A")).unwrap();
        dashboard.next_node();

        dashboard.refresh_with(&source).unwrap();
        let selection = dashboard.selection().unwrap();
        assert_eq!(selection.key, JobKey::new("500", "N/A"));
        assert_eq!(selection.node, 1);
        assert_eq!(dashboard.selected_row().unwrap().job_id, "500");
    }

    #[test]
    fn test_reload_picks_up_new_content() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("%j.out").display().to_string();
        let line = format!("42|42|N/A|cpu|job|RUNNING|0:10|1|n1|{template}|{template}");
        let source = Scripted::new(vec![vec![HEADER, line.as_str()]]);

        let mut dashboard = Dashboard::new(0);
        dashboard.refresh_with(&source).unwrap();
        dashboard.select(&JobKey::new("42", "N/A")).unwrap();
        assert!(dashboard.view().stdout.content.is_placeholder());

        std::fs::write(dir.path().join("42.out"), "hello\n").unwrap();
        dashboard.reload();
        assert_eq!(
            dashboard.view().stdout.content,
            LogContent::Lines {
                lines: vec!["hello".to_string()],
                dropped: 0,
            }
        );
    }

    #[test]
    fn test_quit() {
        let mut dashboard = Dashboard::new(0);
        assert!(!dashboard.should_quit());
        dashboard.quit();
        assert!(dashboard.should_quit());
    }
}
