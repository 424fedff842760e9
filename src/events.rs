use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::App;
use crate::controller::{DownloadFormat, ViewMode};
use crate::ui::{common, CONTENT_TOP};

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

    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // Mode switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_mode();
            } else {
                app.next_mode();
            }
        }
        KeyCode::BackTab => app.prev_mode(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_mode(),
        KeyCode::Right | KeyCode::Char('l') => app.next_mode(),
        KeyCode::Char('1') => app.set_mode(ViewMode::Combine),
        KeyCode::Char('2') => app.set_mode(ViewMode::Table),
        KeyCode::Char('3') => app.set_mode(ViewMode::Flame),
        KeyCode::Char('4') => app.set_mode(ViewMode::Topo),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('?') => app.toggle_help(),

        // Sorting only means something where the table is visible
        KeyCode::Char('s') if app.mode().shows_table() => app.cycle_sort(),
        KeyCode::Char('S') if app.mode().shows_table() => app.toggle_sort_direction(),

        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('c') => {
            if !app.filter_text().is_empty() {
                app.clear_filter();
            }
        }
        KeyCode::Char('t') => app.toggle_text_direction(),

        KeyCode::Char('d') => app.download(DownloadFormat::Image),
        KeyCode::Char('p') => app.download(DownloadFormat::Pprof),

        KeyCode::Char('e') => {
            let export_path = app.export_dir.join(PathBuf::from("profview_export.json"));
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
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

        // Keep the text but stop capturing keys
        KeyCode::Esc => {
            app.cancel_filter();
        }

        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filter();
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text().is_empty() {
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
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            // Tab bar sits right below the header
            if mouse.row == CONTENT_TOP - 1 {
                if let Some(mode) = common::tab_at(mouse.column, 0) {
                    app.set_mode(mode);
                }
                return;
            }

            // Only clicks inside the table body select; the flame pane ignores them
            if let Some(index) = app.table_row_at(mouse.column, mouse.row) {
                app.select_row(index);
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ProfilingViewController, QueryContext};
    use crate::data::TimeRange;
    use crate::query::{FileQuery, QueryParams};
    use crate::ui::Theme;
    use crossterm::event::KeyEventState;
    use ratatui::{backend::TestBackend, Terminal};
    use std::io::Write as _;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const ROWS: &str = r#"{
        "result": true,
        "data": {"diagrams": {
            "unit": "nanoseconds",
            "table_data": [
                {"id": 1, "name": "main", "self": 5, "total": 100},
                {"id": 2, "name": "handler", "self": 40, "total": 90},
                {"id": 3, "name": "malloc", "self": 30, "total": 30}
            ],
            "flame_data": {"id": 0, "name": "total", "value": 100, "children": [
                {"id": 1, "name": "main", "value": 100, "children": []}
            ]}
        }}
    }"#;

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// App over three table rows, drawn once on a 100x30 screen so the
    /// table's on-screen area is known.
    async fn drawn_app(file: &NamedTempFile, mode: ViewMode) -> App {
        let context = QueryContext {
            params: QueryParams::new(),
            time_range: TimeRange::last(Duration::from_secs(3600)),
        };
        let client = Arc::new(FileQuery::new(file.path()));
        let controller = ProfilingViewController::new(client, context, Default::default());
        let mut app = App::with_theme(controller, Theme::dark());
        app.set_mode(mode);
        app.controller.settle().await;

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| crate::ui::draw(frame, &mut app)).unwrap();
        app
    }

    fn rows_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(ROWS.as_bytes()).unwrap();
        file
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> App {
        let context = QueryContext {
            params: QueryParams::new(),
            time_range: TimeRange::last(Duration::from_secs(3600)),
        };
        let client = Arc::new(FileQuery::new("does-not-exist.json"));
        let controller = ProfilingViewController::new(client, context, Default::default());
        App::with_theme(controller, Theme::dark())
    }

    #[tokio::test]
    async fn test_mode_keys() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.mode(), ViewMode::Flame);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.mode(), ViewMode::Topo);
        handle_key_event(&mut app, key(KeyCode::Right));
        assert_eq!(app.mode(), ViewMode::Combine);
        handle_key_event(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.mode(), ViewMode::Topo);
    }

    #[tokio::test]
    async fn test_filter_input_mode() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        assert!(app.filter_active);

        // 'q' is text while filtering, not quit
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        handle_key_event(&mut app, key(KeyCode::Char('s')));
        assert!(app.running);
        assert_eq!(app.filter_text(), "qs");
        assert_eq!(app.controller.flame_filter_keywords(), vec!["qs".to_string()]);

        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(!app.filter_active);

        handle_key_event(&mut app, key(KeyCode::Char('c')));
        assert_eq!(app.filter_text(), "");
    }

    #[tokio::test]
    async fn test_backspace_leaves_filter_when_empty() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert!(!app.filter_active);
    }

    #[tokio::test]
    async fn test_help_swallows_next_key() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[tokio::test]
    async fn test_text_direction_key() {
        let mut app = app();
        let before = app.controller.state().text_direction;
        handle_key_event(&mut app, key(KeyCode::Char('t')));
        assert_eq!(app.controller.state().text_direction, before.toggle());
    }

    #[tokio::test]
    async fn test_tab_click() {
        let mut app = app();
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 14,
            row: CONTENT_TOP - 1,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click);
        assert_eq!(app.mode(), ViewMode::Table);
    }

    #[tokio::test]
    async fn test_click_selects_table_row() {
        let file = rows_file();
        let mut app = drawn_app(&file, ViewMode::Combine).await;

        // Table at x 0..45 from y 2: border, header, then rows from y 4
        handle_mouse_event(&mut app, click(5, 5));
        assert_eq!(app.selected_row, 1);
        assert_eq!(app.controller.state().highlight_id, Some(2));

        // Header row selects nothing
        handle_mouse_event(&mut app, click(5, 3));
        assert_eq!(app.selected_row, 1);
    }

    #[tokio::test]
    async fn test_click_in_flame_pane_keeps_selection() {
        let file = rows_file();
        let mut app = drawn_app(&file, ViewMode::Combine).await;
        assert_eq!(app.selected_row, 0);

        // Same row as a table body line, but right of the split
        handle_mouse_event(&mut app, click(80, 5));
        assert_eq!(app.selected_row, 0);
        assert_eq!(app.controller.state().highlight_id, None);
    }

    #[tokio::test]
    async fn test_click_in_flame_mode_ignored() {
        let file = rows_file();
        let mut app = drawn_app(&file, ViewMode::Flame).await;

        handle_mouse_event(&mut app, click(5, 5));
        assert_eq!(app.selected_row, 0);
        assert_eq!(app.controller.state().highlight_id, None);
    }

    #[tokio::test]
    async fn test_click_accounts_for_scroll_offset() {
        let file = rows_file();
        let mut app = drawn_app(&file, ViewMode::Table).await;
        *app.table_state.offset_mut() = 1;

        handle_mouse_event(&mut app, click(5, 4));
        assert_eq!(app.selected_row, 1);
        assert_eq!(app.controller.state().highlight_id, Some(2));

        // Past the last row
        handle_mouse_event(&mut app, click(5, 6));
        assert_eq!(app.selected_row, 1);
    }
}
