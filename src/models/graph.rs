use serde::{Deserialize, Serialize};
use serde_json::Value;

const FEATURE_NODE_PREFIX: &str = "feature-node-";

/// Deterministic node id for a feature: `feature-node-<feature id>`.
pub fn feature_node_id(feature_id: &str) -> String {
    format!("{}{}", FEATURE_NODE_PREFIX, feature_id)
}

/// Recover the feature id from a node id built by [`feature_node_id`].
pub fn feature_id_of_node(node_id: &str) -> Option<&str> {
    node_id.strip_prefix(FEATURE_NODE_PREFIX)
}

/// Deterministic id for the taxonomy edge `parent -> child`.
pub fn feature_edge_id(parent_feature_id: &str, child_feature_id: &str) -> String {
    format!("edge-{}-{}", parent_feature_id, child_feature_id)
}

/// Id for an edge drawn by hand in the editor.
pub fn connection_edge_id(source: &str, target: &str) -> String {
    format!("xy-edge__{}-{}", source, target)
}

/// The kind of a workflow node. Serialized with the editor's node type names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeKind {
    #[serde(rename = "SingleOutputNode")]
    SingleOutput,
    #[serde(rename = "MultipleOutputNode")]
    MultipleOutput,
    #[serde(rename = "PaperInputNode")]
    PaperInput,
    #[serde(rename = "MTurkOutputNode")]
    MTurkOutput,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };
}

/// A node of the workflow graph.
///
/// `data` is opaque to the graph store; it is whatever the node-data builder
/// produced for the owning feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: Value,
    /// Cleared once auto-layout owns the position.
    #[serde(default = "default_draggable")]
    pub draggable: bool,
}

fn default_draggable() -> bool {
    true
}

impl GraphNode {
    /// Title shown for the node: `data.name` when present, otherwise the id.
    pub fn title(&self) -> &str {
        self.data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(self.id.as_str())
    }
}

/// A directed edge from a parent node to a child node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A change reported by the editor for a node.
///
/// Change types the graph does not track (`select`, `dimensions`, ...) decode
/// as `Other` so the rest of their batch still applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeChange {
    Position { id: String, position: Position },
    Remove { id: String },
    #[serde(other)]
    Other,
}

/// A change reported by the editor for an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeChange {
    Remove { id: String },
    #[serde(other)]
    Other,
}

/// A new edge drawn by the user between two existing nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
}
