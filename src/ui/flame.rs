//! Flame graph rendering.
//!
//! Lays the flame tree out as an icicle (root on top, callees below) and
//! draws it into terminal cells. The same layout backs the SVG export.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::controller::{FlameGraphExport, TextDirection};
use crate::data::format::{format_ratio, format_value};
use crate::data::FlameNode;

/// A positioned node. `start` and `width` are fractions of the root.
#[derive(Debug, Clone, Copy)]
pub struct FlameFrame<'a> {
    pub node: &'a FlameNode,
    pub depth: usize,
    pub start: f64,
    pub width: f64,
}

/// Lay out the tree rooted at `root`, parents before children.
pub fn layout(root: &FlameNode) -> Vec<FlameFrame<'_>> {
    let mut frames = Vec::new();
    if root.weight() > 0 {
        push_frames(root, 0, 0.0, 1.0, &mut frames);
    }
    frames
}

fn push_frames<'a>(
    node: &'a FlameNode,
    depth: usize,
    start: f64,
    width: f64,
    out: &mut Vec<FlameFrame<'a>>,
) {
    out.push(FlameFrame {
        node,
        depth,
        start,
        width,
    });

    let total = node.weight() as f64;
    let mut offset = start;
    for child in &node.children {
        let child_weight = child.weight();
        if child_weight == 0 {
            continue;
        }
        let child_width = width * (child_weight as f64 / total);
        push_frames(child, depth + 1, offset, child_width, out);
        offset += child_width;
    }
}

/// Whether `name` matches any of the filter keywords (case-insensitive).
pub fn matches_keywords(name: &str, keywords: &[String]) -> bool {
    let name = name.to_lowercase();
    keywords.iter().any(|k| name.contains(&k.to_lowercase()))
}

/// Render the flame graph panel.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();
    let keywords = app.controller.flame_filter_keywords();

    let title = match keywords.first() {
        Some(k) => format!(" Flame graph [/{}] ", k),
        None => " Flame graph ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(ref root) = state.flame_data else {
        return;
    };
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    // Bottom line shows the highlighted (or root) frame's value.
    let graph_height = inner.height.saturating_sub(1);
    let frames = layout(root);
    let total = root.weight();

    for f in &frames {
        let row = f.depth as u16;
        if row >= graph_height {
            continue;
        }
        let col = (f.start * f64::from(inner.width)).round() as u16;
        let end = ((f.start + f.width) * f64::from(inner.width)).round() as u16;
        if col >= inner.width {
            continue;
        }
        let width = end.saturating_sub(col).max(1).min(inner.width - col);

        let style = frame_style(app, f.node, &keywords, state.highlight_id);
        let text = cell_text(&f.node.name, width as usize, state.text_direction);

        let buf = frame.buffer_mut();
        for (i, ch) in text.chars().enumerate().take(width as usize) {
            let x = inner.x + col + i as u16;
            let y = inner.y + row;
            buf[(x, y)].set_char(ch).set_style(style);
        }
    }

    let focus = state
        .highlight_id
        .and_then(|id| root.find(id))
        .unwrap_or(root);
    let detail = format!(
        " {}: {} ({})",
        focus.name,
        format_value(focus.weight(), &state.unit),
        format_ratio(focus.weight(), total)
    );
    let detail_area = Rect::new(inner.x, inner.y + graph_height, inner.width, 1);
    frame.render_widget(
        Paragraph::new(state.text_direction.truncate(&detail, inner.width as usize))
            .style(Style::default().add_modifier(Modifier::DIM)),
        detail_area,
    );
}

fn frame_style(app: &App, node: &FlameNode, keywords: &[String], highlight: Option<u64>) -> Style {
    let fill = if keywords.is_empty() {
        app.theme.flame_color(&node.name)
    } else if matches_keywords(&node.name, keywords) {
        app.theme.search_match
    } else {
        app.theme.muted
    };

    let style = Style::default().bg(fill).fg(Color::Black);
    if highlight == Some(node.id) {
        style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        style
    }
}

/// Label padded to fill the cell, or blank when there is no room for text.
fn cell_text(name: &str, width: usize, direction: TextDirection) -> String {
    if width < 3 {
        return " ".repeat(width);
    }
    let label = direction.truncate(name, width - 1);
    format!(" {:<w$}", label, w = width - 1)
}

/// Writes flame graphs as standalone SVG files.
#[derive(Debug, Clone)]
pub struct SvgExporter {
    dir: PathBuf,
    dark: bool,
}

impl SvgExporter {
    pub fn new<P: AsRef<Path>>(dir: P, dark: bool) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            dark,
        }
    }
}

impl FlameGraphExport for SvgExporter {
    fn export_image(
        &self,
        root: &FlameNode,
        unit: &str,
        keywords: &[String],
    ) -> anyhow::Result<PathBuf> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = self.dir.join(format!("flamegraph-{}.svg", stamp));
        let svg = render_svg(root, unit, keywords, self.dark);
        fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

const SVG_WIDTH: f64 = 1200.0;
const SVG_ROW: f64 = 18.0;
const SVG_HEADER: f64 = 28.0;

/// Render the flame tree as an SVG document string.
pub fn render_svg(root: &FlameNode, unit: &str, keywords: &[String], dark: bool) -> String {
    let frames = layout(root);
    let total = root.weight();
    let height = SVG_HEADER + root.depth() as f64 * SVG_ROW + 4.0;

    let (bg, text_color) = if dark {
        ("#1a1a2e", "#e0e0e0")
    } else {
        ("#ffffff", "#1a1a2e")
    };

    let mut svg = String::with_capacity(frames.len() * 200);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" style="font-family:system-ui,-apple-system,sans-serif;font-size:11px">"#,
        w = SVG_WIDTH,
        h = height,
    ));
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="{}"/>"#,
        SVG_WIDTH, height, bg
    ));
    svg.push_str(&format!(
        r#"<text x="8" y="18" fill="{}" style="font-size:13px">{} ({})</text>"#,
        text_color,
        escape_xml(&root.name),
        escape_xml(&format_value(total, unit)),
    ));

    for f in &frames {
        let x = f.start * SVG_WIDTH;
        let y = SVG_HEADER + f.depth as f64 * SVG_ROW;
        let w = f.width * SVG_WIDTH;
        let fill = svg_fill(&f.node.name, keywords, dark);
        let tooltip = format!(
            "{} {} ({})",
            f.node.name,
            format_value(f.node.weight(), unit),
            format_ratio(f.node.weight(), total)
        );

        svg.push_str(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" rx="1"><title>{}</title></rect>"#,
            x,
            y,
            w,
            SVG_ROW - 1.0,
            fill,
            escape_xml(&tooltip),
        ));

        // Render text label if rect is wide enough
        if w > 30.0 {
            let max_chars = (w / 7.0) as usize;
            let label = TextDirection::Ltr.truncate(&f.node.name, max_chars);
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" fill="{}" style="pointer-events:none">{}</text>"#,
                x + 3.0,
                y + SVG_ROW * 0.7,
                "#1a1a2e",
                escape_xml(&label),
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

fn svg_fill(name: &str, keywords: &[String], dark: bool) -> &'static str {
    const DARK: [&str; 4] = ["#f44336", "#ffa726", "#ff7043", "#fbc02d"];
    const LIGHT: [&str; 4] = ["#e63946", "#f4845f", "#ee6c4d", "#e9c46a"];

    if !keywords.is_empty() {
        return if matches_keywords(name, keywords) {
            "#ab47bc"
        } else if dark {
            "#424242"
        } else {
            "#dee2e6"
        };
    }
    let palette = if dark { &DARK } else { &LIGHT };
    palette[super::theme::name_hash(name) % palette.len()]
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
