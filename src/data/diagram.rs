//! Diagram payloads returned by the profiling backend.
//!
//! The viewer does not interpret these beyond what the renderers need to
//! draw them. Unknown table-row fields are kept so they survive a state
//! export. Flame nodes carry only what the layout needs; they can nest
//! hundreds of frames deep and are decoded without per-node buffering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialized call-graph description (usually DOT or SVG source).
pub type TopoSource = String;

/// Diagram shapes that can be requested from the backend in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    Table,
    Flamegraph,
    Callgraph,
}

impl DiagramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramType::Table => "table",
            DiagramType::Flamegraph => "flamegraph",
            DiagramType::Callgraph => "callgraph",
        }
    }
}

/// One row of the profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Time (or bytes, samples…) spent in the function itself.
    #[serde(default, rename = "self")]
    pub self_value: u64,
    /// Time spent in the function and everything it calls.
    #[serde(default)]
    pub total: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A node of the flame graph tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlameNode {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub children: Vec<FlameNode>,
}

impl FlameNode {
    /// Value used for layout: the reported value, or the children's sum when
    /// the backend left it out.
    pub fn weight(&self) -> u64 {
        if self.value > 0 {
            self.value
        } else {
            self.children.iter().map(FlameNode::weight).sum()
        }
    }

    /// Depth of the deepest leaf below (and including) this node.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(FlameNode::depth).max().unwrap_or(0)
    }

    /// Find a node by id anywhere in the subtree.
    pub fn find(&self, id: u64) -> Option<&FlameNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// The `diagrams` object of a query response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagrams {
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub table_data: Vec<TableRow>,
    #[serde(default)]
    pub flame_data: Option<FlameNode>,
    #[serde(default)]
    pub call_graph_data: Option<Value>,
}

impl Diagrams {
    /// The call graph as displayable source text.
    ///
    /// Strings are passed through; structured payloads are kept as pretty
    /// JSON. Absent data yields an empty string.
    pub fn topo_source(&self) -> TopoSource {
        match &self.call_graph_data {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => serde_json::to_string_pretty(other).unwrap_or_default(),
        }
    }

    /// Keep only the parts belonging to the requested diagram types.
    pub fn retain(&mut self, types: &[DiagramType]) {
        if !types.contains(&DiagramType::Table) {
            self.table_data.clear();
        }
        if !types.contains(&DiagramType::Flamegraph) {
            self.flame_data = None;
        }
        if !types.contains(&DiagramType::Callgraph) {
            self.call_graph_data = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: u64, name: &str, value: u64) -> FlameNode {
        FlameNode {
            id,
            name: name.to_string(),
            value,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_table_row_keeps_unknown_fields() {
        let json = r##"{"id":3,"name":"main","self":10,"total":40,"color":"#ff0000"}"##;
        let row: TableRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.self_value, 10);
        assert_eq!(row.total, 40);
        assert_eq!(row.extra.get("color"), Some(&Value::from("#ff0000")));

        let back = serde_json::to_value(&row).unwrap();
        assert_eq!(back["self"], 10);
        assert_eq!(back["color"], "#ff0000");
    }

    #[test]
    fn test_flame_weight_falls_back_to_children() {
        let root = FlameNode {
            id: 0,
            name: "total".to_string(),
            value: 0,
            children: vec![leaf(1, "a", 30), leaf(2, "b", 12)],
        };
        assert_eq!(root.weight(), 42);
        assert_eq!(root.depth(), 2);
        assert_eq!(root.find(2).map(|n| n.name.as_str()), Some("b"));
        assert!(root.find(9).is_none());
    }

    #[test]
    fn test_topo_source_variants() {
        let mut diagrams = Diagrams::default();
        assert_eq!(diagrams.topo_source(), "");

        diagrams.call_graph_data = Some(Value::from("digraph { a -> b }"));
        assert_eq!(diagrams.topo_source(), "digraph { a -> b }");

        diagrams.call_graph_data = Some(serde_json::json!({"call_graph_nodes": []}));
        assert!(diagrams.topo_source().contains("call_graph_nodes"));
    }

    #[test]
    fn test_retain_drops_unrequested_parts() {
        let mut diagrams = Diagrams {
            unit: "nanoseconds".to_string(),
            table_data: vec![serde_json::from_str(r#"{"id":1,"name":"f"}"#).unwrap()],
            flame_data: Some(leaf(0, "total", 1)),
            call_graph_data: Some(Value::from("digraph {}")),
        };
        diagrams.retain(&[DiagramType::Callgraph]);
        assert!(diagrams.table_data.is_empty());
        assert!(diagrams.flame_data.is_none());
        assert!(diagrams.call_graph_data.is_some());
        assert_eq!(diagrams.unit, "nanoseconds");
    }
}
