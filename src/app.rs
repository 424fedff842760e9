//! Application state and navigation logic.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::layout::{Position, Rect};
use ratatui::widgets::TableState;

use crate::controller::{
    DownloadFormat, ProfilingViewController, TableSort, ViewMode,
};
use crate::data::{TableRow, TimeRange};
use crate::ui::flame::SvgExporter;
use crate::ui::Theme;

/// How long temporary status messages stay visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
///
/// Everything about the profile itself lives in the controller; the app
/// adds what only the terminal needs (selection, overlays, input modes).
pub struct App {
    pub running: bool,
    pub show_help: bool,

    pub controller: ProfilingViewController,

    // Navigation state
    pub selected_row: usize,
    pub topo_scroll: u16,

    /// Kept across frames so the table's scroll offset survives redraws.
    pub table_state: TableState,
    /// Where the table was last drawn; empty when it is not on screen.
    pub table_area: Rect,

    // Sorting (table renderer)
    pub sort: TableSort,

    // Search/filter input mode; the keyword itself lives in the controller
    pub filter_active: bool,

    /// Look-back window re-anchored to "now" on reload; `None` for fixed ranges.
    pub lookback: Option<Duration>,
    /// Directory downloads and exports are written to.
    pub export_dir: PathBuf,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App around a controller, detecting the terminal theme.
    pub fn new(controller: ProfilingViewController) -> Self {
        Self::with_theme(controller, Theme::auto_detect())
    }

    /// Create a new App with an explicit theme.
    pub fn with_theme(controller: ProfilingViewController, theme: Theme) -> Self {
        Self {
            running: true,
            show_help: false,
            controller,
            selected_row: 0,
            topo_scroll: 0,
            table_state: TableState::default(),
            table_area: Rect::default(),
            sort: TableSort::default(),
            filter_active: false,
            lookback: None,
            export_dir: PathBuf::from("."),
            theme,
            status_message: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.controller.state().mode
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Apply finished fetches and fire pending refreshes.
    ///
    /// Returns true if the view state changed.
    pub fn tick(&mut self) -> bool {
        let changed = self.controller.poll();
        if changed {
            let count = self.visible_rows().len();
            if self.selected_row >= count {
                self.selected_row = count.saturating_sub(1);
            }
        }
        changed
    }

    /// Refetch, moving a look-back window up to the current time.
    pub fn reload(&mut self) {
        match self.lookback {
            Some(window) => self.controller.set_time_range(TimeRange::last(window)),
            None => self.controller.on_parameters_or_time_range_changed(),
        }
    }

    /// Switch to a specific mode.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.controller.on_mode_change(mode);
        self.topo_scroll = 0;
    }

    /// Switch to the next mode (Combine → Table → Flame → Topo).
    pub fn next_mode(&mut self) {
        self.set_mode(self.mode().next());
    }

    /// Switch to the previous mode.
    pub fn prev_mode(&mut self) {
        self.set_mode(self.mode().prev());
    }

    /// Table rows matching the filter keyword, in backend order.
    pub fn visible_rows(&self) -> Vec<&TableRow> {
        let state = self.controller.state();
        let keyword = state.filter_keyword.trim().to_lowercase();
        state
            .table_data
            .iter()
            .filter(|row| keyword.is_empty() || row.name.to_lowercase().contains(&keyword))
            .collect()
    }

    /// The row under the cursor.
    pub fn selected_table_row(&self) -> Option<&TableRow> {
        self.visible_rows().get(self.selected_row).copied()
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        if self.mode() == ViewMode::Topo {
            let max = self.topo_line_count().saturating_sub(1);
            self.topo_scroll = (self.topo_scroll.saturating_add(n as u16)).min(max);
            return;
        }
        let max = self.visible_rows().len().saturating_sub(1);
        self.selected_row = (self.selected_row + n).min(max);
        self.sync_highlight();
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        if self.mode() == ViewMode::Topo {
            self.topo_scroll = self.topo_scroll.saturating_sub(n as u16);
            return;
        }
        self.selected_row = self.selected_row.saturating_sub(n);
        self.sync_highlight();
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        if self.mode() == ViewMode::Topo {
            self.topo_scroll = 0;
            return;
        }
        self.selected_row = 0;
        self.sync_highlight();
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        if self.mode() == ViewMode::Topo {
            self.topo_scroll = self.topo_line_count().saturating_sub(1);
            return;
        }
        self.selected_row = self.visible_rows().len().saturating_sub(1);
        self.sync_highlight();
    }

    /// Map a click to a visible table row, accounting for the border,
    /// header row and scroll offset. `None` outside the table body.
    pub fn table_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.table_area;
        if !area.contains(Position::new(column, row)) {
            return None;
        }
        // border + header above, border below
        let first = area.y + 2;
        let last = area.bottom().saturating_sub(1);
        if row < first || row >= last {
            return None;
        }
        let index = self.table_state.offset() + usize::from(row - first);
        (index < self.visible_rows().len()).then_some(index)
    }

    /// Select a visual row directly (mouse click).
    pub fn select_row(&mut self, index: usize) {
        if index < self.visible_rows().len() {
            self.selected_row = index;
            self.sync_highlight();
        }
    }

    fn topo_line_count(&self) -> u16 {
        line_count(&self.controller.state().topo_src)
    }

    // The table's "update-highlight" event.
    fn sync_highlight(&mut self) {
        let id = self.selected_table_row().map(|row| row.id);
        self.controller.on_highlight(id);
    }

    /// Cycle to the next sort column and re-request the table.
    pub fn cycle_sort(&mut self) {
        self.sort.column = self.sort.column.next();
        self.apply_sort();
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        self.sort.ascending = !self.sort.ascending;
        self.apply_sort();
    }

    // The table's "sort-change" event.
    fn apply_sort(&mut self) {
        self.selected_row = 0;
        self.controller.on_sort_change(&self.sort.directive());
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.controller.set_filter_keyword(String::new());
        self.filter_active = false;
        self.selected_row = 0;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        let mut keyword = self.controller.state().filter_keyword.clone();
        keyword.push(c);
        self.controller.set_filter_keyword(keyword);
        self.selected_row = 0;
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        let mut keyword = self.controller.state().filter_keyword.clone();
        keyword.pop();
        self.controller.set_filter_keyword(keyword);
        self.selected_row = 0;
    }

    pub fn filter_text(&self) -> &str {
        &self.controller.state().filter_keyword
    }

    pub fn toggle_text_direction(&mut self) {
        self.controller.toggle_text_direction();
    }

    /// Download the flame graph in the given format and report the outcome.
    pub fn download(&mut self, format: DownloadFormat) {
        let exporter = SvgExporter::new(&self.export_dir, self.theme.dark);
        let message = match self.controller.on_download(format, &exporter) {
            Ok(Some(path)) => format!("Saved flame graph to {}", path.display()),
            Ok(None) => match format {
                DownloadFormat::Image => "No flame graph to download".to_string(),
                DownloadFormat::Pprof => "pprof download is not supported yet".to_string(),
            },
            Err(e) => format!("Download failed: {}", e),
        };
        self.set_status_message(message);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current state to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        export_state(&self.controller, path)
    }
}

/// Line count clamped to the widest scroll offset a Paragraph accepts.
fn line_count(text: &str) -> u16 {
    u16::try_from(text.lines().count()).unwrap_or(u16::MAX)
}

/// Write the controller's context and view state as pretty JSON.
pub fn export_state(controller: &ProfilingViewController, path: &Path) -> Result<()> {
    use std::io::Write;

    let state = controller.state();
    let (start, end) = controller.context().time_range.to_micros();

    let export = serde_json::json!({
        "source": controller.source_description(),
        "params": controller.context().params,
        "start": start,
        "end": end,
        "empty": state.empty,
        "unit": state.unit,
        "table_data": state.table_data,
        "flame_data": state.flame_data,
        "call_graph_data": state.topo_src,
    });

    let json = serde_json::to_string_pretty(&export)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(json.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerOptions, QueryContext, SortColumn};
    use crate::query::FileQuery;
    use crate::query::QueryParams;
    use std::io::Write as _;
    use std::sync::Arc;
    use tempfile::{NamedTempFile, TempDir};

    const FIXTURE: &str = r#"{
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
            ]},
            "call_graph_data": "digraph {\n  main -> handler\n  handler -> malloc\n}"
        }}
    }"#;

    fn fixture() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        file
    }

    fn app(file: &NamedTempFile) -> App {
        let context = QueryContext {
            params: QueryParams::new().with("service_name", "cart"),
            time_range: TimeRange::last(Duration::from_secs(3600)),
        };
        let controller = ProfilingViewController::new(
            Arc::new(FileQuery::new(file.path())),
            context,
            ControllerOptions::default(),
        );
        App::with_theme(controller, Theme::dark())
    }

    #[test]
    fn test_line_count_saturates() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("a\nb\nc"), 3);
        // 70k lines would wrap to a small number with a plain cast
        let huge = "x\n".repeat(70_000);
        assert_eq!(line_count(&huge), u16::MAX);
    }

    #[tokio::test]
    async fn test_selection_emits_highlight() {
        let file = fixture();
        let mut app = app(&file);
        app.controller.settle().await;

        assert_eq!(app.visible_rows().len(), 3);
        app.select_next();
        assert_eq!(app.selected_row, 1);
        assert_eq!(app.controller.state().highlight_id, Some(2));

        app.select_last();
        assert_eq!(app.controller.state().highlight_id, Some(3));
        app.select_next_n(10);
        assert_eq!(app.selected_row, 2);

        app.select_first();
        assert_eq!(app.controller.state().highlight_id, Some(1));
    }

    #[tokio::test]
    async fn test_filter_narrows_rows() {
        let file = fixture();
        let mut app = app(&file);
        app.controller.settle().await;

        app.start_filter();
        for c in "MAL".chars() {
            app.filter_push(c);
        }
        assert_eq!(app.filter_text(), "MAL");
        let names: Vec<_> = app.visible_rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["malloc"]);
        assert_eq!(app.controller.flame_filter_keywords(), vec!["MAL".to_string()]);

        app.filter_pop();
        assert_eq!(app.filter_text(), "MA");
        app.clear_filter();
        assert!(!app.filter_active);
        assert_eq!(app.visible_rows().len(), 3);
    }

    #[tokio::test]
    async fn test_sort_cycle_requests_table() {
        let file = fixture();
        let mut app = app(&file);
        app.controller.settle().await;
        let before = app.controller.requests_issued();

        app.cycle_sort();
        assert_eq!(app.sort.column, SortColumn::Name);
        app.toggle_sort_direction();
        assert!(app.sort.ascending);
        app.controller.settle().await;

        assert_eq!(app.controller.requests_issued(), before + 2);
        assert_eq!(app.visible_rows().len(), 3);
    }

    #[tokio::test]
    async fn test_topo_scrolls_instead_of_selecting() {
        let file = fixture();
        let mut app = app(&file);
        app.controller.settle().await;

        app.set_mode(ViewMode::Topo);
        app.controller.settle().await;
        assert!(app.controller.state().topo_src.starts_with("digraph"));

        app.select_next_n(2);
        assert_eq!(app.topo_scroll, 2);
        app.select_last();
        assert_eq!(app.topo_scroll, 3);
        app.select_prev();
        assert_eq!(app.topo_scroll, 2);
        assert_eq!(app.selected_row, 0);
    }

    #[tokio::test]
    async fn test_download_writes_svg() {
        let file = fixture();
        let dir = TempDir::new().unwrap();
        let mut app = app(&file);
        app.export_dir = dir.path().to_path_buf();

        app.download(DownloadFormat::Image);
        assert_eq!(app.get_status_message(), Some("No flame graph to download"));

        app.controller.settle().await;
        app.download(DownloadFormat::Image);
        let message = app.get_status_message().unwrap().to_string();
        assert!(message.starts_with("Saved flame graph to"));

        let written: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 1);

        app.download(DownloadFormat::Pprof);
        assert_eq!(
            app.get_status_message(),
            Some("pprof download is not supported yet")
        );
    }

    #[tokio::test]
    async fn test_export_state() {
        let file = fixture();
        let dir = TempDir::new().unwrap();
        let mut app = app(&file);
        app.controller.settle().await;

        let path = dir.path().join("state.json");
        app.export_state(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["unit"], "nanoseconds");
        assert_eq!(value["params"]["service_name"], "cart");
        assert_eq!(value["table_data"].as_array().unwrap().len(), 3);
        assert_eq!(value["empty"], false);
    }

    #[tokio::test]
    async fn test_reload_with_lookback_moves_window() {
        let file = fixture();
        let mut app = app(&file);
        app.controller.settle().await;
        let before = app.controller.context().time_range;

        app.lookback = Some(Duration::from_secs(900));
        app.reload();
        assert!(app.controller.refresh_pending());
        let after = app.controller.context().time_range;
        assert_eq!(after.duration(), Duration::from_secs(900));
        assert!(after.end >= before.end);
    }
}
