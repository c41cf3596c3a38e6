//! Key bindings for the selector

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Everything the selector reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    /// Collapse, or move to the parent row.
    Left,
    /// Expand a collapsed or never listed directory.
    Right,
    /// Toggle a directory, edit a file.
    Open,
    Enter,
    Yank,
    Quit,
    Interrupt,
    PageUp,
    PageDown,
    Home,
    End,
}

pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Interrupt),
            KeyCode::Char('n') => Some(Action::Down),
            KeyCode::Char('p') => Some(Action::Up),
            _ => None,
        };
    }
    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Char('o') | KeyCode::Char(' ') => Action::Open,
        KeyCode::Enter => Action::Enter,
        KeyCode::Char('y') => Action::Yank,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Home | KeyCode::Char('g') => Action::Home,
        KeyCode::End | KeyCode::Char('G') => Action::End,
        _ => return None,
    };
    Some(action)
}
