//! Layered ("Sugiyama style") hierarchical layout on top of `petgraph`.
//!
//! 1. A greedy feedback arc set is dropped, leaving a DAG.
//! 2. Every node gets the length of the longest path reaching it as its layer.
//! 3. A few barycenter sweeps reorder each layer to reduce crossings.
//! 4. Layers are stacked along the layout direction and centered on the widest one.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use petgraph::algo::{greedy_feedback_arc_set, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Incoming, Outgoing};

use super::{
    Direction, LayoutEdge, LayoutEngine, LayoutError, LayoutNode, LayoutOptions, LayoutPosition,
};

const ORDERING_SWEEPS: usize = 4;

/// Node weights are indices into the caller's node slice.
type LayerGraph = DiGraph<usize, ()>;

#[derive(Debug, Clone, Default)]
pub struct LayeredLayout {
    options: LayoutOptions,
}

impl LayeredLayout {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Compute positions synchronously.
    pub fn compute(
        &self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
    ) -> Result<Vec<LayoutPosition>, LayoutError> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let dag = acyclic_graph(&build_graph(nodes, edges));
        let ranks = longest_path_ranks(&dag)?;
        let layers = order_layers(&dag, &ranks);
        Ok(self.place(nodes, &dag, &layers))
    }

    fn place(
        &self,
        nodes: &[LayoutNode],
        dag: &LayerGraph,
        layers: &[Vec<NodeIndex>],
    ) -> Vec<LayoutPosition> {
        let opts = &self.options;
        let breadth = |n: &LayoutNode| match opts.direction {
            Direction::Down => n.width,
            Direction::Right => n.height,
        };
        let depth = |n: &LayoutNode| match opts.direction {
            Direction::Down => n.height,
            Direction::Right => n.width,
        };

        let extent = |layer: &[NodeIndex]| -> f64 {
            let sum: f64 = layer.iter().map(|&i| breadth(&nodes[dag[i]])).sum();
            sum + opts.node_spacing * layer.len().saturating_sub(1) as f64
        };
        let widest = layers.iter().map(|l| extent(l.as_slice())).fold(0.0, f64::max);
        let layer_depth = nodes.iter().map(|n| depth(n)).fold(0.0, f64::max);

        let mut positions = vec![None; nodes.len()];
        for (rank, layer) in layers.iter().enumerate() {
            let along = rank as f64 * (layer_depth + opts.layer_spacing);
            let mut across = (widest - extent(layer.as_slice())) / 2.0;
            for &i in layer {
                let node = &nodes[dag[i]];
                let (x, y) = match opts.direction {
                    Direction::Down => (across, along),
                    Direction::Right => (along, across),
                };
                positions[dag[i]] = Some(LayoutPosition {
                    id: node.id.clone(),
                    x,
                    y,
                });
                across += breadth(node) + opts.node_spacing;
            }
        }

        positions.into_iter().flatten().collect()
    }
}

#[async_trait]
impl LayoutEngine for LayeredLayout {
    async fn layout(
        &self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
    ) -> Result<Vec<LayoutPosition>, LayoutError> {
        let engine = self.clone();
        let nodes = nodes.to_vec();
        let edges = edges.to_vec();
        tokio::task::spawn_blocking(move || engine.compute(&nodes, &edges)).await?
    }
}

/// One graph node per layout node, in input order. Unknown endpoints,
/// self-loops and parallel edges are dropped.
fn build_graph(nodes: &[LayoutNode], edges: &[LayoutEdge]) -> LayerGraph {
    let mut graph = LayerGraph::with_capacity(nodes.len(), edges.len());
    let index: HashMap<&str, NodeIndex> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), graph.add_node(i)))
        .collect();

    for edge in edges {
        for source in &edge.sources {
            for target in &edge.targets {
                let (Some(&s), Some(&t)) = (index.get(source.as_str()), index.get(target.as_str()))
                else {
                    continue;
                };
                if s != t {
                    graph.update_edge(s, t, ());
                }
            }
        }
    }
    graph
}

/// Copy of `graph` without its greedy feedback arc set. Node indices are kept.
fn acyclic_graph(graph: &LayerGraph) -> LayerGraph {
    let feedback: HashSet<_> = greedy_feedback_arc_set(graph).map(|e| e.id()).collect();
    graph.filter_map(
        |_, &weight| Some(weight),
        |edge, _| (!feedback.contains(&edge)).then_some(()),
    )
}

fn longest_path_ranks(dag: &LayerGraph) -> Result<Vec<usize>, LayoutError> {
    let order = toposort(dag, None).map_err(|cycle| {
        LayoutError::Engine(format!(
            "cycle left after arc removal at node {}",
            cycle.node_id().index()
        ))
    })?;

    let mut ranks = vec![0usize; dag.node_count()];
    for node in order {
        for next in dag.neighbors_directed(node, Outgoing) {
            ranks[next.index()] = ranks[next.index()].max(ranks[node.index()] + 1);
        }
    }
    Ok(ranks)
}

fn order_layers(dag: &LayerGraph, ranks: &[usize]) -> Vec<Vec<NodeIndex>> {
    let depth = ranks.iter().copied().max().map_or(0, |r| r + 1);
    let mut layers: Vec<Vec<NodeIndex>> = vec![Vec::new(); depth];
    for node in dag.node_indices() {
        layers[ranks[node.index()]].push(node);
    }

    let mut slot = vec![0.0f64; dag.node_count()];
    reindex(&layers, &mut slot);

    for _ in 0..ORDERING_SWEEPS {
        for rank in 1..layers.len() {
            sort_by_barycenter(&mut layers[rank], &slot, |n| {
                dag.neighbors_directed(n, Incoming).collect()
            });
            reindex(&layers, &mut slot);
        }
        for rank in (0..layers.len().saturating_sub(1)).rev() {
            sort_by_barycenter(&mut layers[rank], &slot, |n| {
                dag.neighbors_directed(n, Outgoing).collect()
            });
            reindex(&layers, &mut slot);
        }
    }

    layers
}

fn reindex(layers: &[Vec<NodeIndex>], slot: &mut [f64]) {
    for layer in layers {
        for (i, node) in layer.iter().enumerate() {
            slot[node.index()] = i as f64;
        }
    }
}

/// Stable sort of one layer by the mean slot of each node's neighbours in the
/// adjacent layers. Nodes without neighbours keep their current slot.
fn sort_by_barycenter(
    layer: &mut [NodeIndex],
    slot: &[f64],
    neighbours: impl Fn(NodeIndex) -> Vec<NodeIndex>,
) {
    let mut keyed: Vec<(f64, NodeIndex)> = layer
        .iter()
        .map(|&node| {
            let linked = neighbours(node);
            let key = if linked.is_empty() {
                slot[node.index()]
            } else {
                linked.iter().map(|n| slot[n.index()]).sum::<f64>() / linked.len() as f64
            };
            (key, node)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (entry, (_, node)) in layer.iter_mut().zip(keyed) {
        *entry = node;
    }
}
