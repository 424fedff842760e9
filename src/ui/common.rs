//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and overlays.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::App;
use crate::controller::ViewMode;
use crate::data::duration::format_window;

/// Render the header bar: query target, time window, unit and source.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let context = app.controller.context();
    let state = app.controller.state();

    let window = match app.lookback {
        Some(w) => format!("last {}", format_window(w)),
        None => format_window(context.time_range.duration()),
    };

    let (indicator, indicator_style) = if state.is_loading {
        ("◌", Style::default().fg(app.theme.highlight))
    } else if app.controller.last_failure().is_some() {
        ("●", Style::default().fg(app.theme.search_match))
    } else {
        ("●", Style::default().fg(app.theme.highlight))
    };

    let unit = if state.unit.is_empty() {
        "-"
    } else {
        state.unit.as_str()
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", indicator), indicator_style),
        Span::styled("PROFVIEW ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            context.params.label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::raw(window),
        Span::raw(" │ unit: "),
        Span::raw(unit),
        Span::raw(" │ "),
        Span::styled(
            app.controller.source_description().to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing the view modes.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = ViewMode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| Line::from(format!(" {}:{} ", i + 1, mode.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.mode().index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Which tab (if any) sits at column `x` of a tab bar starting at `area_x`.
///
/// Mirrors the layout `render_tabs` produces: titles separated by a
/// one-column divider.
pub fn tab_at(x: u16, area_x: u16) -> Option<ViewMode> {
    let mut start = area_x;
    for (i, mode) in ViewMode::ALL.iter().enumerate() {
        let width = format!(" {}:{} ", i + 1, mode.label()).chars().count() as u16;
        // Tabs pads each title with one space on either side.
        let end = start + width + 2;
        if x >= start && x < end {
            return Some(*mode);
        }
        start = end + 1;
    }
    None
}

/// Render the status bar at the bottom.
///
/// Shows the controls for the current mode, the filter prompt while typing,
/// and temporary status messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if app.filter_active {
        format!(" Filter: {}_ | Enter:apply Esc:cancel", app.filter_text())
    } else {
        let controls = match app.mode() {
            ViewMode::Combine | ViewMode::Table => {
                "↑↓:select /:filter s:sort S:reverse t:text d:svg Tab:mode ?:help q:quit"
            }
            ViewMode::Flame => "/:filter t:text d:svg p:pprof Tab:mode ?:help q:quit",
            ViewMode::Topo => "↑↓:scroll r:reload Tab:mode ?:help q:quit",
        };
        match app.controller.last_failure() {
            Some(err) => format!(" Error: {} | r:retry | {}", err, controls),
            None => format!(" {}", controls),
        }
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the loading indicator in the top-right corner of `area`.
pub fn render_loading(frame: &mut Frame, app: &App, area: Rect) {
    let text = " Loading… ";
    let width = (text.chars().count() as u16).min(area.width);
    let x = area.x + area.width.saturating_sub(width + 1);
    let loading_area = Rect::new(x, area.y, width, 1.min(area.height));
    frame.render_widget(
        Paragraph::new(text).style(
            Style::default()
                .fg(app.theme.highlight)
                .add_modifier(Modifier::BOLD),
        ),
        loading_area,
    );
}

/// Render the "no data" overlay centered in `area`.
pub fn render_empty(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "No profiling data",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Try a wider time range or other parameters (r to reload)",
            Style::default().fg(app.theme.muted),
        )),
    ];

    let width = 60u16.min(area.width.saturating_sub(2));
    let height = 4u16.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let empty_area = Rect::new(x, y, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.muted));

    frame.render_widget(Clear, empty_area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(ratatui::layout::Alignment::Center),
        empty_area,
    );
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Modes"),
        Line::from("  1-4         Combine/Table/Flame/Topo"),
        Line::from("  Tab ←/→     Cycle modes"),
        Line::from(""),
        section(" Table & Topo"),
        Line::from("  ↑/↓ j/k     Select row / scroll"),
        Line::from("  PgUp/PgDn   Jump 10 rows"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  s           Cycle sort column"),
        Line::from("  S           Toggle sort direction"),
        Line::from(""),
        section(" Flame graph"),
        Line::from("  /           Filter by keyword"),
        Line::from("  c           Clear filter"),
        Line::from("  t           Toggle text direction"),
        Line::from("  d           Download SVG"),
        Line::from("  p           Download pprof"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Reload"),
        Line::from("  e           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 30u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
