use serde::{Deserialize, Serialize};

use crate::data::{FlameNode, TableRow, TopoSource};

/// Which renderer(s) are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Table and flame graph side by side.
    #[default]
    Combine,
    Table,
    Flame,
    /// Call-graph topology.
    Topo,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Combine,
        ViewMode::Table,
        ViewMode::Flame,
        ViewMode::Topo,
    ];

    /// Cycle to the next mode.
    pub fn next(self) -> Self {
        match self {
            ViewMode::Combine => ViewMode::Table,
            ViewMode::Table => ViewMode::Flame,
            ViewMode::Flame => ViewMode::Topo,
            ViewMode::Topo => ViewMode::Combine,
        }
    }

    /// Cycle to the previous mode.
    pub fn prev(self) -> Self {
        match self {
            ViewMode::Combine => ViewMode::Topo,
            ViewMode::Table => ViewMode::Combine,
            ViewMode::Flame => ViewMode::Table,
            ViewMode::Topo => ViewMode::Flame,
        }
    }

    /// Returns the display label for this mode.
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Combine => "Combine",
            ViewMode::Table => "Table",
            ViewMode::Flame => "Flame",
            ViewMode::Topo => "Topo",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ViewMode::Combine => 0,
            ViewMode::Table => 1,
            ViewMode::Flame => 2,
            ViewMode::Topo => 3,
        }
    }

    pub fn shows_table(&self) -> bool {
        matches!(self, ViewMode::Combine | ViewMode::Table)
    }

    pub fn shows_flame(&self) -> bool {
        matches!(self, ViewMode::Combine | ViewMode::Flame)
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "combine" => Ok(ViewMode::Combine),
            "table" => Ok(ViewMode::Table),
            "flame" | "flamegraph" => Ok(ViewMode::Flame),
            "topo" | "callgraph" => Ok(ViewMode::Topo),
            other => Err(format!("unknown view mode: {}", other)),
        }
    }
}

/// Which side of a label is kept when it has to be truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    /// Keep the start of the label.
    #[default]
    Ltr,
    /// Keep the end of the label (useful for long qualified names).
    Rtl,
}

impl TextDirection {
    pub fn toggle(self) -> Self {
        match self {
            TextDirection::Ltr => TextDirection::Rtl,
            TextDirection::Rtl => TextDirection::Ltr,
        }
    }

    /// Fit `label` into `width` characters, marking the cut with `…`.
    pub fn truncate(&self, label: &str, width: usize) -> String {
        let len = label.chars().count();
        if len <= width {
            return label.to_string();
        }
        if width == 0 {
            return String::new();
        }
        let keep = width - 1;
        match self {
            TextDirection::Ltr => {
                let head: String = label.chars().take(keep).collect();
                format!("{}…", head)
            }
            TextDirection::Rtl => {
                let tail: String = label.chars().skip(len - keep).collect();
                format!("…{}", tail)
            }
        }
    }
}

/// Column the backend sorts table data by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Name,
    /// Sort by exclusive value.
    SelfValue,
    /// Sort by inclusive value.
    #[default]
    Total,
}

impl SortColumn {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            SortColumn::Name => SortColumn::SelfValue,
            SortColumn::SelfValue => SortColumn::Total,
            SortColumn::Total => SortColumn::Name,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::SelfValue => "self",
            SortColumn::Total => "total",
        }
    }
}

/// A table sort request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSort {
    pub column: SortColumn,
    pub ascending: bool,
}

impl Default for TableSort {
    fn default() -> Self {
        Self {
            column: SortColumn::Total,
            ascending: false,
        }
    }
}

impl TableSort {
    /// The backend sort directive: the column key, `-` prefixed when descending.
    pub fn directive(&self) -> String {
        if self.ascending {
            self.column.key().to_string()
        } else {
            format!("-{}", self.column.key())
        }
    }
}

/// Requested download format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFormat {
    /// Flame graph image.
    Image,
    /// Raw profile in pprof format.
    Pprof,
}

/// Everything the renderers read.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewState {
    pub mode: ViewMode,
    pub is_loading: bool,
    pub empty: bool,
    pub unit: String,
    pub table_data: Vec<TableRow>,
    pub flame_data: Option<FlameNode>,
    pub topo_src: TopoSource,
    pub highlight_id: Option<u64>,
    pub filter_keyword: String,
    pub text_direction: TextDirection,
}
