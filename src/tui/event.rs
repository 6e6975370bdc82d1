//! Event types for the TUI
//!
//! This module implements a dual-channel event architecture:
//! - InputEvent: Priority channel for user input (never dropped)
//! - DataEvent: Data channel for refresh results and timer ticks

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};

use crate::error::RefreshError;
use crate::models::JobIndex;

/// Input events from the terminal (priority channel - never dropped)
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Keyboard input
    Key(KeyEvent),
    /// Mouse input
    Mouse(MouseEvent),
    /// Terminal resize
    Resize(u16, u16),
}

/// Data and control events
#[derive(Debug)]
pub enum DataEvent {
    /// Once-a-second tick used to expire transient messages
    Tick,

    /// Auto-refresh timer fired
    RefreshTick,

    /// A background fetch, parse and index cycle finished
    RefreshCompleted(Result<JobIndex, RefreshError>),

    /// Clipboard copy finished on a helper thread
    ClipboardResult { success: bool, message: String },
}

/// Result of processing an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue running, UI needs redraw
    Continue,
    /// Continue running, no UI change needed
    Unchanged,
    /// A refresh was accepted and must be dispatched to the worker
    StartRefresh,
    /// Quit the application
    Quit,
}

/// Key action mappings for the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Job table navigation
    MoveUp,
    MoveDown,
    MoveToTop,

    // Log pane
    LogPageUp,
    LogPageDown,
    LogFollow,
    SwitchStream,
    NextNode,
    PreviousNode,
    ReloadLogs,

    // Actions
    Select,
    Refresh,
    OpenSort,
    YankPath,

    // UI
    ShowHelp,
    Escape,
    Quit,

    // Mouse actions
    MouseClick { row: u16, column: u16 },
    MouseScrollUp { row: u16 },
    MouseScrollDown { row: u16 },

    // Unknown/unhandled
    Unknown,
}

impl KeyAction {
    /// Map a mouse event to an action
    pub fn from_mouse_event(event: MouseEvent) -> Self {
        use crossterm::event::{MouseButton, MouseEventKind};

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => KeyAction::MouseClick {
                row: event.row,
                column: event.column,
            },
            MouseEventKind::ScrollUp => KeyAction::MouseScrollUp { row: event.row },
            MouseEventKind::ScrollDown => KeyAction::MouseScrollDown { row: event.row },
            _ => KeyAction::Unknown,
        }
    }

    /// Map a key event to an action
    pub fn from_key_event(event: KeyEvent) -> Self {
        let KeyEvent {
            code, modifiers, ..
        } = event;

        match code {
            // Ctrl+ combinations must come before bare character matches
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
            KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
                KeyAction::LogPageDown
            }
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                KeyAction::LogPageUp
            }

            KeyCode::Char('q') => KeyAction::Quit,

            // Table navigation
            KeyCode::Char('j') | KeyCode::Down => KeyAction::MoveDown,
            KeyCode::Char('k') | KeyCode::Up => KeyAction::MoveUp,
            KeyCode::Char('g') | KeyCode::Home => KeyAction::MoveToTop,

            // Log pane
            KeyCode::PageDown => KeyAction::LogPageDown,
            KeyCode::PageUp => KeyAction::LogPageUp,
            KeyCode::Char('G') | KeyCode::End => KeyAction::LogFollow,
            KeyCode::Tab => KeyAction::SwitchStream,
            KeyCode::Char('n') | KeyCode::Char(']') => KeyAction::NextNode,
            KeyCode::Char('p') | KeyCode::Char('[') => KeyAction::PreviousNode,
            KeyCode::Char('l') => KeyAction::ReloadLogs,

            // Actions
            KeyCode::Enter => KeyAction::Select,
            KeyCode::Char('r') => KeyAction::Refresh,
            KeyCode::Char('s') => KeyAction::OpenSort,
            KeyCode::Char('y') => KeyAction::YankPath,

            // Help
            KeyCode::Char('?') | KeyCode::F(1) => KeyAction::ShowHelp,
            KeyCode::Esc => KeyAction::Escape,

            _ => KeyAction::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{MouseButton, MouseEventKind};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_action_quit() {
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('q'))),
            KeyAction::Quit
        );
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(ctrl_c), KeyAction::Quit);
    }

    #[test]
    fn test_node_navigation_aliases() {
        for code in [KeyCode::Char('n'), KeyCode::Char(']')] {
            assert_eq!(KeyAction::from_key_event(key(code)), KeyAction::NextNode);
        }
        for code in [KeyCode::Char('p'), KeyCode::Char('[')] {
            assert_eq!(
                KeyAction::from_key_event(key(code)),
                KeyAction::PreviousNode
            );
        }
    }

    #[test]
    fn test_log_scroll_keys() {
        let ctrl_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(ctrl_d), KeyAction::LogPageDown);
        assert_eq!(KeyAction::from_key_event(ctrl_u), KeyAction::LogPageUp);
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::End)),
            KeyAction::LogFollow
        );
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('G'))),
            KeyAction::LogFollow
        );
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('r'))),
            KeyAction::Refresh
        );
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('s'))),
            KeyAction::OpenSort
        );
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Enter)),
            KeyAction::Select
        );
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Tab)),
            KeyAction::SwitchStream
        );
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('x'))),
            KeyAction::Unknown
        );
    }

    #[test]
    fn test_mouse_mapping() {
        let event = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 3,
            row: 20,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            KeyAction::from_mouse_event(event),
            KeyAction::MouseScrollDown { row: 20 }
        );

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 1,
            row: 5,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            KeyAction::from_mouse_event(click),
            KeyAction::MouseClick { row: 5, column: 1 }
        );
    }
}
