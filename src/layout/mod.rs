//! Automatic positioning of the workflow graph.
//!
//! Layout is a pluggable capability: the workflow hands a [`LayoutEngine`] abstract
//! node sizes and an edge list and receives a position per node. [`LayeredLayout`]
//! is the built-in hierarchical engine; [`NoopLayout`] leaves positions alone.

mod layered;

pub use layered::LayeredLayout;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{GraphEdge, GraphNode};

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout engine failed: {0}")]
    Engine(String),
    #[error("layout task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// A node as the layout engine sees it: an id and a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

/// An edge as the layout engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub id: String,
    pub sources: Vec<String>,
    pub targets: Vec<String>,
}

/// Top-left corner computed for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Direction in which layers are stacked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Down,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub direction: Direction,
    pub node_width: f64,
    pub node_height: f64,
    /// Gap between consecutive layers.
    pub layer_spacing: f64,
    /// Gap between neighbouring nodes of one layer.
    pub node_spacing: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Down,
            node_width: 160.0,
            node_height: 60.0,
            layer_spacing: 100.0,
            node_spacing: 80.0,
        }
    }
}

impl LayoutOptions {
    /// Describe the graph to a layout engine using this configuration's node box.
    pub fn describe(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
    ) -> (Vec<LayoutNode>, Vec<LayoutEdge>) {
        let layout_nodes = nodes
            .iter()
            .map(|n| LayoutNode {
                id: n.id.clone(),
                width: self.node_width,
                height: self.node_height,
            })
            .collect();
        let layout_edges = edges
            .iter()
            .map(|e| LayoutEdge {
                id: e.id.clone(),
                sources: vec![e.source.clone()],
                targets: vec![e.target.clone()],
            })
            .collect();
        (layout_nodes, layout_edges)
    }
}

#[async_trait]
pub trait LayoutEngine: Send + Sync {
    async fn layout(
        &self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
    ) -> Result<Vec<LayoutPosition>, LayoutError>;
}

/// Returns no positions, so nodes keep wherever they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLayout;

#[async_trait]
impl LayoutEngine for NoopLayout {
    async fn layout(
        &self,
        _nodes: &[LayoutNode],
        _edges: &[LayoutEdge],
    ) -> Result<Vec<LayoutPosition>, LayoutError> {
        Ok(Vec::new())
    }
}
