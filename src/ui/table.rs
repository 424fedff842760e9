//! Profile table rendering.
//!
//! Rows arrive already ordered by the backend; this view only filters them
//! by keyword and tracks the selection.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::app::App;
use crate::controller::{SortColumn, TableSort};
use crate::data::format::{format_ratio, format_value};

/// Render the table view.
///
/// Takes `app` mutably to keep the table's scroll state and on-screen area
/// for mouse hit-testing.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let state = app.controller.state();
    let rows = app.visible_rows();

    // Percentages are relative to the whole profile, not the filtered rows.
    let whole = state
        .flame_data
        .as_ref()
        .map(|root| root.weight())
        .unwrap_or_else(|| state.table_data.iter().map(|r| r.total).max().unwrap_or(0));

    let header = Row::new(vec![
        Cell::from(format_header("Name", SortColumn::Name, app.sort)),
        Cell::from(format_header("Self", SortColumn::SelfValue, app.sort)),
        Cell::from(format_header("Total", SortColumn::Total, app.sort)),
        Cell::from("Total %"),
    ])
    .height(1)
    .style(app.theme.header);

    let name_width = area.width.saturating_sub(40).max(8) as usize;
    let table_rows: Vec<Row> = rows
        .iter()
        .map(|r| {
            let style = if state.highlight_id == Some(r.id) {
                Style::default().fg(app.theme.highlight)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(state.text_direction.truncate(&r.name, name_width)),
                Cell::from(format_value(r.self_value, &state.unit)),
                Cell::from(format_value(r.total, &state.unit)),
                Cell::from(format_ratio(r.total, whole)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Min(10),
        Constraint::Min(10),
        Constraint::Min(9),
    ];

    let selected = app.selected_row.min(rows.len().saturating_sub(1));

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text())
    } else if !app.filter_text().is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text())
    } else {
        String::new()
    };

    let position_info = if !rows.is_empty() {
        format!(" [{}/{}]", selected + 1, rows.len())
    } else {
        String::new()
    };

    let title = format!(
        " Functions ({}/{}) [s:sort {}{}]{}{} ",
        rows.len(),
        state.table_data.len(),
        app.sort.column.key(),
        sort_arrow(app.sort),
        filter_info,
        position_info
    );

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let selection = (!rows.is_empty()).then_some(selected);
    app.table_state.select(selection);
    app.table_area = area;
    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn sort_arrow(sort: TableSort) -> &'static str {
    if sort.ascending {
        "↑"
    } else {
        "↓"
    }
}

/// Column header with the sort arrow on the active column.
fn format_header(name: &str, column: SortColumn, sort: TableSort) -> String {
    if sort.column == column {
        format!("{} {}", name, sort_arrow(sort))
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_header_marks_active_column() {
        let sort = TableSort::default();
        assert_eq!(format_header("Total", SortColumn::Total, sort), "Total ↓");
        assert_eq!(format_header("Name", SortColumn::Name, sort), "Name");

        let asc = TableSort {
            column: SortColumn::Name,
            ascending: true,
        };
        assert_eq!(format_header("Name", SortColumn::Name, asc), "Name ↑");
    }
}
