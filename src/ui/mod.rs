//! Terminal UI rendering using ratatui.
//!
//! Each renderer reads the controller's view state and draws one panel;
//! none of them fetch or mutate anything.
//!
//! ## Submodules
//!
//! - [`table`]: Function table with self/total values
//! - [`flame`]: Icicle flame graph, plus SVG export
//! - [`topo`]: Scrollable call-graph source
//! - [`common`]: Shared components (header, tabs, status bar, overlays)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ Combine: table │ flame               │
//! │ or a single table/flame/topo panel   │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - common::render_empty
//!    - common::render_loading
//!    - common::render_help
//! ```

pub mod common;
pub mod flame;
pub mod table;
pub mod theme;
pub mod topo;

pub use theme::Theme;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::controller::ViewMode;

/// Rows taken by the header and tab bar above the content area.
pub const CONTENT_TOP: u16 = 2;

/// Draw a full frame.
pub fn draw(frame: &mut Frame, app: &mut App) {
    // Only a table drawn this frame is clickable.
    app.table_area = Rect::default();

    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Tabs
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);
    render_content(frame, app, chunks[2]);
    common::render_status_bar(frame, app, chunks[3]);

    let state = app.controller.state();
    if state.empty && !state.is_loading {
        common::render_empty(frame, app, chunks[2]);
    }
    if state.is_loading {
        common::render_loading(frame, app, chunks[2]);
    }
    if app.show_help {
        common::render_help(frame, app, area);
    }
}

fn render_content(frame: &mut Frame, app: &mut App, area: Rect) {
    match app.mode() {
        ViewMode::Combine => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(area);
            table::render(frame, app, halves[0]);
            flame::render(frame, app, halves[1]);
        }
        ViewMode::Table => table::render(frame, app, area),
        ViewMode::Flame => flame::render(frame, app, area),
        ViewMode::Topo => topo::render(frame, app, area),
    }
}
