//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Flame graph fill colors, picked per function name.
const DARK_FLAME: [Color; 4] = [
    Color::Rgb(244, 67, 54),
    Color::Rgb(255, 167, 38),
    Color::Rgb(255, 112, 67),
    Color::Rgb(251, 192, 45),
];
const LIGHT_FLAME: [Color; 4] = [
    Color::Rgb(230, 57, 70),
    Color::Rgb(244, 132, 95),
    Color::Rgb(238, 108, 77),
    Color::Rgb(233, 196, 106),
];

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Whether this is the dark variant (also used for SVG export).
    pub dark: bool,
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for the empty-state and error text.
    pub muted: Color,
    /// Color for frames matching the filter keyword.
    pub search_match: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
    flame: [Color; 4],
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            dark: true,
            highlight: Color::Cyan,
            border: Color::Gray,
            muted: Color::DarkGray,
            search_match: Color::Magenta,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
            flame: DARK_FLAME,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            dark: false,
            highlight: Color::Blue,
            border: Color::DarkGray,
            muted: Color::Gray,
            search_match: Color::Magenta,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
            flame: LIGHT_FLAME,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Stable fill color for a flame frame.
    pub fn flame_color(&self, name: &str) -> Color {
        self.flame[name_hash(name) % self.flame.len()]
    }
}

/// FNV-1a over the name, so a function keeps its color across refreshes.
pub(crate) fn name_hash(name: &str) -> usize {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash as usize
}
