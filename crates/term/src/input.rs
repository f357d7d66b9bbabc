//! Key mapping from terminal events to front-end actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::types::BinType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    LaneUp,
    LaneDown,
    /// Drop the front-most item of the selected lane into a bin.
    Drop(BinType),
    /// Leave the result screen for the next attempt.
    Continue,
    Quit,
}

pub fn map_key(key: KeyEvent) -> Option<UiAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(UiAction::Quit);
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('w') => Some(UiAction::LaneUp),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('s') => Some(UiAction::LaneDown),
        KeyCode::Char('1') | KeyCode::Char('o') => Some(UiAction::Drop(BinType::Order)),
        KeyCode::Char('2') | KeyCode::Char('g') => Some(UiAction::Drop(BinType::Good)),
        KeyCode::Char('3') | KeyCode::Char('t') => Some(UiAction::Drop(BinType::Trash)),
        KeyCode::Enter | KeyCode::Char(' ') => Some(UiAction::Continue),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(UiAction::Quit),
        _ => None,
    }
}

/// Lane selection after `action`, wrapping within `lanes`.
pub fn step_lane(selected: u32, lanes: u32, action: UiAction) -> u32 {
    let lanes = lanes.max(1);
    let selected = selected.min(lanes - 1);
    match action {
        UiAction::LaneUp => selected.checked_sub(1).unwrap_or(lanes - 1),
        UiAction::LaneDown => (selected + 1) % lanes,
        _ => selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_keys() {
        assert_eq!(
            map_key(KeyEvent::from(KeyCode::Char('1'))),
            Some(UiAction::Drop(BinType::Order))
        );
        assert_eq!(
            map_key(KeyEvent::from(KeyCode::Char('2'))),
            Some(UiAction::Drop(BinType::Good))
        );
        assert_eq!(
            map_key(KeyEvent::from(KeyCode::Char('3'))),
            Some(UiAction::Drop(BinType::Trash))
        );
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('q'))), Some(UiAction::Quit));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(UiAction::Quit)
        );
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_lane_selection_wraps() {
        assert_eq!(step_lane(0, 3, UiAction::LaneUp), 2);
        assert_eq!(step_lane(2, 3, UiAction::LaneDown), 0);
        assert_eq!(step_lane(1, 3, UiAction::Continue), 1);
        // Selection is pulled back when the next level has fewer lanes.
        assert_eq!(step_lane(3, 2, UiAction::Quit), 1);
        assert_eq!(step_lane(0, 1, UiAction::LaneDown), 0);
    }

    #[test]
    fn test_lane_selection_with_many_lanes() {
        assert_eq!(step_lane(0, 300, UiAction::LaneUp), 299);
        assert_eq!(step_lane(299, 300, UiAction::LaneDown), 0);
        assert_eq!(step_lane(255, 300, UiAction::LaneDown), 256);
    }
}
