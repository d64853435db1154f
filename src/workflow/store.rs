//! The in-memory workflow graph.
//!
//! The store behaves as a set: inserting something already present and removing
//! something absent are both silent no-ops, so every operation is idempotent.

use serde_json::Value;

use crate::layout::LayoutPosition;
use crate::models::*;

use super::chain::resolve_chain;

/// Builds the payload of the node created for a feature.
pub type NodeDataFn = dyn Fn(&Feature) -> Value + Send + Sync;

/// What a call to [`GraphStore::add_feature_chain`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainInsert {
    pub nodes_added: usize,
    pub edges_added: usize,
}

impl ChainInsert {
    pub fn is_noop(&self) -> bool {
        self.nodes_added == 0 && self.edges_added == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStore {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn has_node(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == node_id)
    }

    pub fn has_edge(&self, edge_id: &str) -> bool {
        self.edges.iter().any(|e| e.id == edge_id)
    }

    /// Add the node for `feature` at the origin unless it already exists.
    pub fn ensure_node(&mut self, feature: &Feature, to_node_data: &NodeDataFn) -> bool {
        let id = feature_node_id(&feature.id);
        if self.has_node(&id) {
            return false;
        }

        self.nodes.push(GraphNode {
            id,
            kind: NodeKind::SingleOutput,
            position: Position::ORIGIN,
            data: to_node_data(feature),
            draggable: true,
        });
        true
    }

    /// Add the edge `parent -> child` unless it already exists.
    pub fn ensure_edge(&mut self, parent: &Feature, child: &Feature) -> bool {
        let id = feature_edge_id(&parent.id, &child.id);
        if self.has_edge(&id) {
            return false;
        }

        self.edges.push(GraphEdge {
            id,
            source: feature_node_id(&parent.id),
            target: feature_node_id(&child.id),
        });
        true
    }

    /// Insert the target feature, its resolvable ancestors, and the edges linking
    /// each ancestor to the next feature down the chain.
    pub fn add_feature_chain(
        &mut self,
        target_id: &str,
        all_features: &[Feature],
        to_node_data: &NodeDataFn,
    ) -> ChainInsert {
        let chain = resolve_chain(target_id, all_features);
        let mut inserted = ChainInsert::default();

        for feature in &chain {
            if self.ensure_node(feature, to_node_data) {
                inserted.nodes_added += 1;
            }
        }

        // chain is child-first, so each window is (child, parent)
        for pair in chain.windows(2) {
            if self.ensure_edge(pair[1], pair[0]) {
                inserted.edges_added += 1;
            }
        }

        inserted
    }

    /// Remove the node for `feature_id` and every edge touching it.
    /// Ancestors stay, since siblings may still need them.
    pub fn remove_feature(&mut self, feature_id: &str) -> bool {
        self.remove_node(&feature_node_id(feature_id))
    }

    fn remove_node(&mut self, node_id: &str) -> bool {
        let before = (self.nodes.len(), self.edges.len());
        self.nodes.retain(|n| n.id != node_id);
        self.edges.retain(|e| !e.touches(node_id));
        before != (self.nodes.len(), self.edges.len())
    }

    /// Apply node moves and removals reported by the editor.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) -> bool {
        let mut changed = false;
        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) {
                        if node.position != *position {
                            node.position = *position;
                            changed = true;
                        }
                    }
                }
                NodeChange::Remove { id } => {
                    changed |= self.remove_node(id);
                }
                NodeChange::Other => {}
            }
        }
        changed
    }

    /// Apply edge removals reported by the editor.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) -> bool {
        let mut changed = false;
        for change in changes {
            match change {
                EdgeChange::Remove { id } => {
                    let before = self.edges.len();
                    self.edges.retain(|e| &e.id != id);
                    changed |= before != self.edges.len();
                }
                EdgeChange::Other => {}
            }
        }
        changed
    }

    /// Add a user-drawn edge. Self-loops, unknown endpoints and duplicates of an
    /// existing `(source, target)` pair are ignored.
    pub fn connect(&mut self, connection: &Connection) -> bool {
        let Connection { source, target } = connection;
        if source == target || !self.has_node(source) || !self.has_node(target) {
            return false;
        }
        if self
            .edges
            .iter()
            .any(|e| &e.source == source && &e.target == target)
        {
            return false;
        }

        self.edges.push(GraphEdge {
            id: connection_edge_id(source, target),
            source: source.clone(),
            target: target.clone(),
        });
        true
    }

    /// Merge laid-out positions into matching nodes and pin them.
    /// Returns how many nodes were repositioned.
    pub fn apply_positions(&mut self, positions: &[LayoutPosition]) -> usize {
        let mut applied = 0;
        for node in &mut self.nodes {
            if let Some(p) = positions.iter().find(|p| p.id == node.id) {
                node.position = Position { x: p.x, y: p.y };
                node.draggable = false;
                applied += 1;
            }
        }
        applied
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn replace(&mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) {
        self.nodes = nodes;
        self.edges = edges;
    }
}
