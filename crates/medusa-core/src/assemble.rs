//! Post-processing of the raw walked graph into a finished diagram.
//!
//! Runs after the tree walk, in order: anchor synthesis for parentless
//! siblings, the degenerate empty-document node, empty-parent pruning,
//! breadcrumb paths, and dangling-edge pruning. Paths are computed against the
//! full edge set so array indices stay stable even when a sibling was pruned.

use std::collections::HashSet;

use crate::graph::{Diagram, NodeId, NodeText};
use crate::measure::NodeSizer;
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::walk::walk_document;
use crate::Result;

pub(crate) fn assemble(root: &SyntaxNode, sizer: &mut NodeSizer) -> Result<Diagram> {
    let state = walk_document(root, sizer)?;
    let mut diagram = state.diagram;
    let orphans = state.orphans;

    // A single root keeps the layout sane: adopt parentless siblings under a
    // synthetic anchor. A root-level array already compiled to one container,
    // so it never triggers this.
    if orphans.len() > 1 && root.kind != SyntaxKind::Array {
        let anchor = diagram.add_node(
            NodeText::Plain(String::new()),
            SyntaxKind::Null,
            true,
            sizer,
        );
        for orphan in &orphans {
            diagram.add_edge(anchor, *orphan);
        }
    }

    // Degenerate empty document still renders one node.
    if diagram.nodes.is_empty() {
        let text = if root.kind == SyntaxKind::Array {
            "[]"
        } else {
            "{}"
        };
        diagram.add_node(NodeText::Plain(text.to_string()), SyntaxKind::Null, false, sizer);
    }

    // A container with no surviving children is visual noise.
    diagram
        .nodes
        .retain(|n| !(n.data.is_parent && n.data.children_count == 0));

    let paths: Vec<(NodeId, String)> = diagram
        .nodes
        .iter()
        .map(|n| (n.id, node_path(&diagram, n.id)))
        .collect();
    for (id, path) in paths {
        if let Some(node) = diagram.node_mut(id) {
            node.path = path;
        }
    }

    let surviving: HashSet<NodeId> = diagram.nodes.iter().map(|n| n.id).collect();
    diagram
        .edges
        .retain(|e| surviving.contains(&e.from) && surviving.contains(&e.to));

    tracing::debug!(
        nodes = diagram.nodes.len(),
        edges = diagram.edges.len(),
        "assembled diagram"
    );

    Ok(diagram)
}

/// Breadcrumb for one node: the root segment, then one `.label` per
/// object/array ancestor (and the node itself when it is a container), with
/// `[index]` after each array that the chain descends through.
fn node_path(diagram: &Diagram, id: NodeId) -> String {
    let mut chain = vec![id];
    let mut current = id;
    while let Some(parent) = diagram.parent_of(current) {
        chain.push(parent);
        current = parent;
        if chain.len() > diagram.nodes.len() + diagram.edges.len() {
            // bail on a cyclic edge set rather than loop forever
            break;
        }
    }
    chain.reverse();

    let anchor = diagram
        .nodes
        .iter()
        .find(|n| n.data.is_empty)
        .map(|n| n.id);
    let root_level: Vec<NodeId> = match anchor {
        Some(anchor) => diagram.outgoing(anchor).map(|e| e.to).collect(),
        None => diagram
            .nodes
            .iter()
            .filter(|n| diagram.parent_of(n.id).is_none())
            .map(|n| n.id)
            .collect(),
    };

    let mut path = String::new();
    let top_index = chain
        .iter()
        .find_map(|id| root_level.iter().position(|r| r == id));
    match top_index {
        Some(index) if root_level.len() > 1 => path.push_str(&format!("Root[{index}]")),
        _ => path.push_str("{Root}"),
    }

    for (i, &step) in chain.iter().enumerate() {
        let Some(node) = diagram.node(step) else {
            break;
        };
        if !node.data.is_parent {
            continue;
        }
        if let Some(label) = node.text.as_plain() {
            if !label.is_empty() {
                path.push('.');
                path.push_str(label);
            }
        }
        if node.data.kind == SyntaxKind::Array {
            if let Some(&next) = chain.get(i + 1) {
                if let Some(index) = diagram.outgoing(step).position(|e| e.to == next) {
                    path.push_str(&format!("[{index}]"));
                }
            }
        }
    }

    path
}
