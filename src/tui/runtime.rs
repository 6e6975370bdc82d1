//! Async runtime and task management for the TUI
//!
//! This module implements the dual-channel event-driven architecture:
//! - Input channel (priority): User input events that are never dropped
//! - Data channel: refresh results and timer ticks
//!
//! The main loop uses `tokio::select!` with bias toward the input channel
//! to prevent input starvation under heavy data update loads. Refreshes are
//! requested by the app and run by a single worker, so at most one squeue
//! call is ever in flight.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dashboard::load_index;
use crate::error::RefreshError;
use crate::models::JobIndex;
use crate::slurm::QueueSource;
use crate::tui::app::App;
use crate::tui::event::{DataEvent, EventResult, InputEvent};

/// Channel capacities
const INPUT_CHANNEL_CAPACITY: usize = 16;
const DATA_CHANNEL_CAPACITY: usize = 32;
/// One pending request is enough: the dashboard refuses overlapping refreshes.
const REFRESH_CHANNEL_CAPACITY: usize = 1;

/// Interval of the housekeeping tick (message expiry)
const UI_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// TUI runtime managing all background tasks
pub struct TuiRuntime {
    cancel_token: CancellationToken,
    task_handles: Vec<JoinHandle<()>>,
}

impl Default for TuiRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiRuntime {
    /// Create a new TUI runtime
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            task_handles: Vec::new(),
        }
    }

    /// Get a clone of the cancellation token for spawning tasks
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Add a task handle to track
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.task_handles.push(handle);
    }

    /// Signal shutdown and wait for tasks to complete
    pub async fn shutdown(self) {
        self.cancel_token.cancel();

        let shutdown = async {
            for handle in self.task_handles {
                let _ = handle.await;
            }
        };

        tokio::select! {
            _ = shutdown => {}
            _ = tokio::time::sleep(Duration::from_secs(2)) => {
                // A squeue call stuck in spawn_blocking cannot be interrupted
                tracing::warn!("background tasks did not stop in time");
            }
        }
    }
}

/// Spawn the input event reader task
pub fn spawn_input_task(tx: mpsc::Sender<InputEvent>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = EventStream::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe_event = reader.next() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            let input_event = match event {
                                Event::Key(key) => Some(InputEvent::Key(key)),
                                Event::Mouse(mouse) => Some(InputEvent::Mouse(mouse)),
                                Event::Resize(w, h) => Some(InputEvent::Resize(w, h)),
                                _ => None,
                            };

                            if let Some(evt) = input_event
                                && tx.send(evt).await.is_err()
                            {
                                break; // Receiver dropped
                            }
                        }
                        Some(Err(e)) => {
                            let is_fatal = matches!(
                                e.kind(),
                                std::io::ErrorKind::BrokenPipe
                                    | std::io::ErrorKind::ConnectionReset
                                    | std::io::ErrorKind::UnexpectedEof
                            );

                            if is_fatal {
                                tracing::info!("Terminal disconnected: {:?}", e);
                                break;
                            } else {
                                tracing::warn!("Terminal event read error: {:?}", e);
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    })
}

/// Spawn the refresh worker.
///
/// Every request on `requests` runs one fetch, parse and index cycle on the
/// blocking pool and reports it as [`DataEvent::RefreshCompleted`]. Results
/// wait for channel capacity and are never dropped.
pub fn spawn_refresh_worker(
    source: Arc<dyn QueueSource>,
    mut requests: mpsc::Receiver<()>,
    tx: mpsc::Sender<DataEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                request = requests.recv() => {
                    if request.is_none() {
                        break;
                    }
                    let result = run_refresh(Arc::clone(&source)).await;
                    let event = DataEvent::RefreshCompleted(result);
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

async fn run_refresh(source: Arc<dyn QueueSource>) -> Result<JobIndex, RefreshError> {
    tracing::debug!(source = %source.describe(), "refreshing queue snapshot");
    match tokio::task::spawn_blocking(move || load_index(source.as_ref())).await {
        Ok(result) => result,
        Err(e) => Err(RefreshError::Worker(format!("task join error: {}", e))),
    }
}

/// Spawn the auto-refresh timer.
///
/// Ticks are dropped under backpressure; the next one comes soon enough.
pub fn spawn_auto_refresh(
    tx: mpsc::Sender<DataEvent>,
    cancel: CancellationToken,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; the initial snapshot is already loaded
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if tx.try_send(DataEvent::RefreshTick).is_err() {
                        tracing::debug!("Could not send refresh tick (channel full)");
                    }
                }
            }
        }
    })
}

/// Spawn the housekeeping tick task
pub fn spawn_ui_tick(tx: mpsc::Sender<DataEvent>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UI_TICK_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let _ = tx.try_send(DataEvent::Tick);
                }
            }
        }
    })
}

/// Run the main TUI event loop
pub async fn run_event_loop(
    mut app: App,
    mut input_rx: mpsc::Receiver<InputEvent>,
    mut data_rx: mpsc::Receiver<DataEvent>,
    refresh_tx: mpsc::Sender<()>,
    mut render_fn: impl FnMut(&App) -> Result<()>,
) -> Result<App> {
    let mut needs_render = true;

    loop {
        if needs_render {
            render_fn(&app)?;
            needs_render = false;
        }

        if app.dashboard.should_quit() {
            break;
        }

        let result = tokio::select! {
            // Bias toward input channel to prevent input starvation
            biased;

            Some(input) = input_rx.recv() => app.handle_input(input),
            Some(data) = data_rx.recv() => app.handle_data(data),

            else => break,
        };

        match result {
            EventResult::Continue => needs_render = true,
            EventResult::Unchanged => {}
            EventResult::StartRefresh => {
                if refresh_tx.try_send(()).is_err() {
                    app.refresh_dispatch_failed();
                }
                needs_render = true;
            }
            EventResult::Quit => break,
        }
    }

    Ok(app)
}

/// Channels used by the TUI: input, data, and refresh requests
pub struct Channels {
    pub input_tx: mpsc::Sender<InputEvent>,
    pub input_rx: mpsc::Receiver<InputEvent>,
    pub data_tx: mpsc::Sender<DataEvent>,
    pub data_rx: mpsc::Receiver<DataEvent>,
    pub refresh_tx: mpsc::Sender<()>,
    pub refresh_rx: mpsc::Receiver<()>,
}

/// Create the channels for the TUI
pub fn create_channels() -> Channels {
    let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    let (data_tx, data_rx) = mpsc::channel(DATA_CHANNEL_CAPACITY);
    let (refresh_tx, refresh_rx) = mpsc::channel(REFRESH_CHANNEL_CAPACITY);
    Channels {
        input_tx,
        input_rx,
        data_tx,
        data_rx,
        refresh_tx,
        refresh_rx,
    }
}
