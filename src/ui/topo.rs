//! Call-graph view.
//!
//! The backend sends the topology as text (DOT source); it is shown as-is
//! in a scrollable panel.

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();
    let lines = state.topo_src.lines().count();

    let title = if lines > 0 {
        format!(
            " Call graph [{}/{}] ",
            (app.topo_scroll as usize + 1).min(lines),
            lines
        )
    } else {
        " Call graph ".to_string()
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let paragraph = Paragraph::new(state.topo_src.as_str())
        .block(block)
        .scroll((app.topo_scroll, 0));

    frame.render_widget(paragraph, area);
}
