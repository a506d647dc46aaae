//! Collapse/expand bookkeeping for a compiled diagram.
//!
//! The engine never mutates the [`Diagram`]; it maintains three id sets the
//! rendering surface uses purely as a filter. All operations are
//! read-modify-write within one call, and set unions make repeated collapses
//! idempotent.

use indexmap::IndexSet;

use crate::graph::{Diagram, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilitySet {
    /// Containers the user collapsed.
    pub collapsed_parents: IndexSet<NodeId>,
    /// Everything transitively hidden as a result.
    pub collapsed_nodes: IndexSet<NodeId>,
    pub collapsed_edges: IndexSet<String>,
}

/// Result of a descendant walk: the reachable nodes, plus any still-collapsed
/// parents the walk stopped at (their boxes may need revealing even though
/// their subtrees stay hidden).
#[derive(Debug, Clone, Default)]
pub struct Descendants {
    pub nodes: Vec<NodeId>,
    pub boundary_parents: Vec<NodeId>,
}

/// Walks outgoing edges from `node_id`, stopping at (but recording) members
/// of `boundary`. When `node_id` itself is inside the boundary it is included
/// in its own result set, so re-collapsing a nested container while an
/// ancestor is collapsed still works.
pub fn descendants_of(
    diagram: &Diagram,
    node_id: NodeId,
    boundary: &IndexSet<NodeId>,
) -> Descendants {
    let mut nodes: Vec<NodeId> = Vec::new();
    let mut boundary_parents: Vec<NodeId> = Vec::new();

    if boundary.contains(&node_id) && diagram.node(node_id).is_some() {
        nodes.push(node_id);
    }

    let mut stack = vec![node_id];
    while let Some(current) = stack.pop() {
        for edge in diagram.outgoing(current) {
            let child = edge.to;
            if boundary.contains(&child) {
                if !boundary_parents.contains(&child) {
                    boundary_parents.push(child);
                }
                continue;
            }
            if diagram.node(child).is_none() || nodes.contains(&child) {
                continue;
            }
            nodes.push(child);
            stack.push(child);
        }
    }

    Descendants {
        nodes,
        boundary_parents,
    }
}

/// Edge ids touching any node of `nodes` on either endpoint.
fn subtree_edge_ids(diagram: &Diagram, nodes: &[NodeId]) -> Vec<String> {
    diagram
        .edges
        .iter()
        .filter(|e| nodes.contains(&e.from) || nodes.contains(&e.to))
        .map(|e| e.id.clone())
        .collect()
}

impl VisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_node_hidden(&self, id: NodeId) -> bool {
        self.collapsed_nodes.contains(&id)
    }

    pub fn is_edge_hidden(&self, id: &str) -> bool {
        self.collapsed_edges.contains(id)
    }

    pub fn is_collapsed_parent(&self, id: NodeId) -> bool {
        self.collapsed_parents.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed_parents.is_empty()
            && self.collapsed_nodes.is_empty()
            && self.collapsed_edges.is_empty()
    }

    /// Hides the transitive descendants of `node_id`.
    pub fn collapse(&mut self, diagram: &Diagram, node_id: NodeId) {
        let descendants = descendants_of(diagram, node_id, &IndexSet::new());
        let edge_ids = subtree_edge_ids(diagram, &descendants.nodes);

        self.collapsed_parents.insert(node_id);
        self.collapsed_nodes.extend(descendants.nodes);
        self.collapsed_edges.extend(edge_ids);
    }

    /// Reveals the subtree of `node_id`, but leaves anything nested inside
    /// another still-collapsed parent hidden. Collapsed parents adjacent to
    /// the revealed subtree get their boxes back without their contents.
    pub fn expand(&mut self, diagram: &Diagram, node_id: NodeId) {
        let descendants = descendants_of(diagram, node_id, &self.collapsed_parents);
        let edge_ids = subtree_edge_ids(diagram, &descendants.nodes);

        let endpoints: IndexSet<NodeId> = diagram
            .edges
            .iter()
            .filter(|e| edge_ids.contains(&e.id))
            .flat_map(|e| [e.from, e.to])
            .collect();

        let mut reveal = descendants.nodes;
        reveal.extend(
            descendants
                .boundary_parents
                .iter()
                .copied()
                .filter(|p| endpoints.contains(p)),
        );

        self.collapsed_parents.shift_remove(&node_id);
        for id in &reveal {
            self.collapsed_nodes.shift_remove(id);
        }
        for id in &edge_ids {
            self.collapsed_edges.shift_remove(id);
        }
    }

    /// Collapses the whole graph down to a one-level overview: only the
    /// root-level containers and their direct children stay visible. Returns
    /// the shallowest still-visible collapsed container so the caller can
    /// recenter its viewport on it.
    pub fn collapse_all(&mut self, diagram: &Diagram) -> Option<NodeId> {
        let roots: IndexSet<NodeId> = diagram
            .nodes
            .iter()
            .filter(|n| diagram.parent_of(n.id).is_none())
            .map(|n| n.id)
            .collect();
        let second_degree: IndexSet<NodeId> = diagram
            .edges
            .iter()
            .filter(|e| roots.contains(&e.from))
            .map(|e| e.to)
            .collect();

        self.collapsed_parents = diagram
            .nodes
            .iter()
            .filter(|n| n.data.is_parent && !roots.contains(&n.id))
            .map(|n| n.id)
            .collect();
        self.collapsed_nodes = diagram
            .nodes
            .iter()
            .filter(|n| !roots.contains(&n.id) && !second_degree.contains(&n.id))
            .map(|n| n.id)
            .collect();
        self.collapsed_edges = diagram
            .edges
            .iter()
            .filter(|e| !roots.contains(&e.from))
            .map(|e| e.id.clone())
            .collect();

        self.collapsed_parents.iter().copied().min()
    }

    /// Clears all three collections, revealing the whole graph.
    pub fn expand_all(&mut self) {
        self.collapsed_parents.clear();
        self.collapsed_nodes.clear();
        self.collapsed_edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::NodeSizer;
    use crate::syntax::parse_syntax_tree;

    fn compile(text: &str) -> Diagram {
        let tree = parse_syntax_tree(text).unwrap();
        let mut sizer = NodeSizer::new();
        crate::assemble::assemble(&tree, &mut sizer).unwrap()
    }

    fn find(diagram: &Diagram, label: &str) -> NodeId {
        diagram
            .nodes
            .iter()
            .find(|n| n.text.as_plain() == Some(label))
            .unwrap_or_else(|| panic!("no node labeled {label}"))
            .id
    }

    const SAMPLE: &str = r#"{"root":{"a":{"x":1,"list":[1,2]},"b":{"y":2}}}"#;

    #[test]
    fn collapse_hides_the_whole_subtree() {
        let diagram = compile(SAMPLE);
        let mut vis = VisibilitySet::new();
        let a = find(&diagram, "a");

        vis.collapse(&diagram, a);

        assert!(vis.is_collapsed_parent(a));
        assert!(!vis.is_node_hidden(a));
        let list = find(&diagram, "list");
        assert!(vis.is_node_hidden(list));
        for edge in diagram.outgoing(list) {
            assert!(vis.is_edge_hidden(&edge.id));
        }
    }

    #[test]
    fn collapse_is_idempotent() {
        let diagram = compile(SAMPLE);
        let mut vis = VisibilitySet::new();
        let a = find(&diagram, "a");

        vis.collapse(&diagram, a);
        let once = vis.clone();
        vis.collapse(&diagram, a);
        assert_eq!(vis, once);
    }

    #[test]
    fn expand_undoes_a_single_collapse() {
        let diagram = compile(SAMPLE);
        let mut vis = VisibilitySet::new();
        let a = find(&diagram, "a");

        vis.collapse(&diagram, a);
        vis.expand(&diagram, a);

        assert!(vis.is_empty());
    }

    #[test]
    fn expand_keeps_nested_collapsed_subtrees_hidden() {
        let diagram = compile(SAMPLE);
        let mut vis = VisibilitySet::new();
        let root = find(&diagram, "root");
        let a = find(&diagram, "a");
        let list = find(&diagram, "list");

        vis.collapse(&diagram, a);
        vis.collapse(&diagram, root);
        vis.expand(&diagram, root);

        // "a" is visible again as a collapsed box; its subtree stays hidden
        assert!(!vis.is_node_hidden(a));
        assert!(vis.is_collapsed_parent(a));
        assert!(vis.is_node_hidden(list));
    }

    #[test]
    fn nested_collapse_under_a_collapsed_ancestor_includes_itself() {
        let diagram = compile(SAMPLE);
        let root = find(&diagram, "root");
        let a = find(&diagram, "a");

        let mut boundary = IndexSet::new();
        boundary.insert(root);
        boundary.insert(a);
        let descendants = descendants_of(&diagram, a, &boundary);
        assert!(descendants.nodes.contains(&a));
    }

    #[test]
    fn collapse_all_leaves_a_one_level_overview() {
        let diagram = compile(SAMPLE);
        let mut vis = VisibilitySet::new();

        let focus = vis.collapse_all(&diagram);

        let root = find(&diagram, "root");
        let a = find(&diagram, "a");
        let b = find(&diagram, "b");
        let list = find(&diagram, "list");

        assert!(!vis.is_node_hidden(root));
        // direct children of the root stay visible as collapsed boxes
        assert!(!vis.is_node_hidden(a));
        assert!(!vis.is_node_hidden(b));
        assert!(vis.is_collapsed_parent(a));
        assert!(vis.is_node_hidden(list));
        assert_eq!(focus, Some(a.min(b)));

        vis.expand_all();
        assert!(vis.is_empty());
    }

    #[test]
    fn single_node_diagram_survives_collapse_all() {
        let diagram = compile(r#"{"a":1}"#);
        let mut vis = VisibilitySet::new();
        let focus = vis.collapse_all(&diagram);
        assert_eq!(focus, None);
        assert!(vis.collapsed_nodes.is_empty());
    }
}
