//! ASCII tree rendering for workflow graphs.

use std::collections::{HashMap, HashSet};

use crate::models::{feature_id_of_node, GraphNode, WorkflowSnapshot};

const SELECTED: char = '●';
const ANCESTOR: char = '○';
const SHOWN_ABOVE: &str = " ↑";

/// Render the workflow graph as ASCII art, roots first.
///
/// Selected features are marked `●`; ancestors pulled in by a selection are `○`.
/// A node reached again through a second parent is printed once more with a
/// trailing `↑` and not expanded. Nodes no root reaches (cycles hanging off the
/// rest of the graph) are rendered afterwards as extra roots.
///
/// Example output:
/// ```text
/// ○ Paper
/// └── ○ Experiments
///     ├── ● Sample size
///     └── ● Condition name
/// ```
pub fn render_tree(snapshot: &WorkflowSnapshot) -> String {
    let nodes: HashMap<&str, &GraphNode> = snapshot
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n))
        .collect();

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &snapshot.edges {
        if nodes.contains_key(edge.source.as_str()) && nodes.contains_key(edge.target.as_str()) {
            children
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
        }
    }

    let mut roots: Vec<&str> = snapshot
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| !children.values().any(|targets| targets.contains(id)))
        .collect();
    // unreachable leftovers, in node order
    roots.extend(snapshot.nodes.iter().map(|n| n.id.as_str()));

    let mut renderer = Renderer {
        nodes,
        children,
        selected: &snapshot.selected_feature_ids,
        visited: HashSet::new(),
    };
    let mut output = String::new();
    for root in roots {
        if !renderer.visited.contains(root) {
            renderer.render_node(&mut output, root, "", true, true, &mut Vec::new());
        }
    }
    output
}

struct Renderer<'a> {
    nodes: HashMap<&'a str, &'a GraphNode>,
    children: HashMap<&'a str, Vec<&'a str>>,
    selected: &'a [String],
    visited: HashSet<&'a str>,
}

impl<'a> Renderer<'a> {
    fn symbol(&self, node_id: &str) -> char {
        let selected = feature_id_of_node(node_id)
            .is_some_and(|feature_id| self.selected.iter().any(|s| s == feature_id));
        if selected {
            SELECTED
        } else {
            ANCESTOR
        }
    }

    fn render_node(
        &mut self,
        output: &mut String,
        node_id: &'a str,
        prefix: &str,
        is_last: bool,
        is_root: bool,
        path: &mut Vec<&'a str>,
    ) {
        let Some(&node) = self.nodes.get(node_id) else {
            return;
        };
        let repeat = !self.visited.insert(node_id);

        if !is_root {
            let branch = if is_last { "└── " } else { "├── " };
            output.push_str(prefix);
            output.push_str(branch);
        }
        output.push(self.symbol(node_id));
        output.push(' ');
        output.push_str(node.title());
        if repeat {
            output.push_str(SHOWN_ABOVE);
        }
        output.push('\n');
        if repeat {
            return;
        }

        let child_prefix = if is_root {
            String::new()
        } else {
            let continuation = if is_last { "    " } else { "│   " };
            format!("{}{}", prefix, continuation)
        };

        path.push(node_id);
        let children: Vec<&str> = self
            .children
            .get(node_id)
            .map(|c| c.iter().copied().filter(|c| !path.contains(c)).collect())
            .unwrap_or_default();
        for (i, &child) in children.iter().enumerate() {
            let child_is_last = i == children.len() - 1;
            self.render_node(output, child, &child_prefix, child_is_last, false, path);
        }
        path.pop();
    }
}
