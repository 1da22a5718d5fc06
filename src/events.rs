use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// Written by the `e` key, relative to the working directory.
pub const EXPORT_FILE: &str = "diagnostics_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.show_detail_overlay {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.close_overlay();
            }
            // Step through events while the overlay is open
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::PageUp => app.select_prev_n(10),
            KeyCode::PageDown => app.select_next_n(10),
            KeyCode::Home => app.select_first(),
            KeyCode::End => app.select_last(),
            _ => {}
        }
        return;
    }

    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        KeyCode::Char('1') => app.set_view(View::Events),
        KeyCode::Char('2') => app.set_view(View::Components),
        KeyCode::Char('3') => app.set_view(View::Sensors),

        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Enter => app.enter_detail(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        KeyCode::Char('r') => {
            let _ = app.reload_data();
        }
        KeyCode::Char('p') => app.cycle_policy(),
        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.toggle_sort_direction(),

        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('c') => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => app.set_status_message(format!("Exported to {}", export_path.display())),
                Err(e) => app.set_status_message(format!("Export failed: {}", e)),
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Keep text but exit input mode
        KeyCode::Esc => {
            app.cancel_filter();
        }

        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filter();
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            if clicked_row > content_start_row {
                let item_row = (clicked_row - content_start_row - 1) as usize;
                if item_row < app.row_count() {
                    app.selected_index = item_row;
                }
            }

            // Tab bar is row 1: " 1:Events | 2:Components | 3:Sensors "
            if clicked_row == 1 {
                let col = mouse.column;
                if col < 11 {
                    app.set_view(View::Events);
                } else if col < 26 {
                    app.set_view(View::Components);
                } else if col < 38 {
                    app.set_view(View::Sensors);
                }
            }
        }

        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DiagnosticsOptions;
    use crate::source::{ModelEvaluation, StaticSource};
    use crate::ui::Theme;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use eqwatch_types::TagComponentMap;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> App {
        let doc = r#"{"predicted_ranges": [
            {"start": "2019-08-08T00:42", "end": "2019-08-08T01:48", "diagnostics": [{"name": "pump\\Sensor0", "value": 1.0}]},
            {"start": "2019-09-01T00:00", "end": "2019-09-01T00:04", "diagnostics": [{"name": "pump\\Sensor1", "value": 1.0}]}
        ]}"#;
        let source = StaticSource::new(ModelEvaluation::parse(doc).unwrap());
        let map = TagComponentMap::builder().component("impeller", ["Sensor0", "Sensor1"]).build().unwrap();
        let mut app = App::new(Box::new(source), map, DiagnosticsOptions::default());
        app.theme = Theme::dark();
        app.reload_data().unwrap();
        app
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn test_filter_input_mode() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        for c in "sensor1".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c)));
        }
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(!app.filter_active);
        assert_eq!(app.visible_events().len(), 1);

        // 'q' typed while filtering is text, not quit
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.running);
        assert_eq!(app.filter_text, "sensor1q");
    }

    #[test]
    fn test_overlay_navigation() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(app.show_detail_overlay);
        handle_key_event(&mut app, key(KeyCode::Down));
        assert_eq!(app.selected_index, 1);
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(!app.show_detail_overlay);
    }

    #[test]
    fn test_number_keys_switch_views() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.current_view, View::Sensors);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }
}
