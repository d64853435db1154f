use serde::{Deserialize, Serialize};

use super::{GraphEdge, GraphNode};

/// The persisted state of one editing session.
///
/// Created empty, mutated by every add/remove, and saved or reloaded wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub selected_feature_ids: Vec<String>,
}

impl WorkflowSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.selected_feature_ids.is_empty()
    }
}
