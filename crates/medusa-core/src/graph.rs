//! The diagram graph model and its append-only builder operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::measure::NodeSizer;
use crate::syntax::SyntaxKind;

/// Sequential node id, 1-based, unique within one compilation pass; never
/// reused or reordered. Rendering surfaces address nodes by string id, so it
/// serializes as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u32>().map(NodeId).map_err(serde::de::Error::custom)
    }
}

/// Node text: a plain string (scalar value or container label), or the merged
/// `(key, value)` rows of a composite node. Row values hold JSON literal text
/// so renderers can display `key: value` lines verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeText {
    Plain(String),
    Rows(Vec<(String, String)>),
}

impl NodeText {
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            NodeText::Plain(s) => Some(s),
            NodeText::Rows(_) => None,
        }
    }

    pub fn rows(&self) -> Option<&[(String, String)]> {
        match self {
            NodeText::Plain(_) => None,
            NodeText::Rows(rows) => Some(rows),
        }
    }
}

impl From<&str> for NodeText {
    fn from(value: &str) -> Self {
        NodeText::Plain(value.to_string())
    }
}

impl From<String> for NodeText {
    fn from(value: String) -> Self {
        NodeText::Plain(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub kind: SyntaxKind,
    pub is_parent: bool,
    /// True only for the synthetic anchor that adopts parentless siblings.
    pub is_empty: bool,
    /// Outgoing-edge count, finalized when the node's subtree traversal
    /// completes. Provisional until then.
    pub children_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramNode {
    pub id: NodeId,
    pub text: NodeText,
    pub width: f64,
    pub height: f64,
    /// Breadcrumb path, computed only after the whole graph is built.
    #[serde(default)]
    pub path: String,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub id: String,
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl Diagram {
    /// Deterministic edge id; duplicate edges between the same pair collide
    /// rather than duplicate.
    pub fn edge_id(from: NodeId, to: NodeId) -> String {
        format!("e{from}-{to}")
    }

    pub fn node(&self, id: NodeId) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut DiagramNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &DiagramEdge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// First incoming edge's source. The walker emits at most one incoming
    /// edge per node.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.edges.iter().find(|e| e.to == id).map(|e| e.from)
    }

    /// Allocates the next sequential id, sizes the node, and appends it.
    /// `children_count` starts at 1 for containers as a placeholder; the real
    /// outgoing-edge count is filled in when the subtree traversal completes.
    pub(crate) fn add_node(
        &mut self,
        text: NodeText,
        kind: SyntaxKind,
        is_empty: bool,
        sizer: &mut NodeSizer,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32 + 1);
        let is_parent = kind.is_container();
        let size = sizer.node_size(&text, is_parent);

        self.nodes.push(DiagramNode {
            id,
            text,
            width: size.width,
            height: size.height,
            path: String::new(),
            data: NodeData {
                kind,
                is_parent,
                is_empty,
                children_count: if is_parent { 1 } else { 0 },
            },
        });

        id
    }

    /// Appends an edge without validating the endpoints; the walk may connect
    /// nodes before both are finalized, and the assembler prunes anything that
    /// ends up dangling.
    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let id = Self::edge_id(from, to);
        if self.edges.iter().any(|e| e.id == id) {
            return;
        }
        self.edges.push(DiagramEdge { id, from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_sequential_from_one() {
        let mut diagram = Diagram::default();
        let mut sizer = NodeSizer::new();
        let a = diagram.add_node("a".into(), SyntaxKind::String, false, &mut sizer);
        let b = diagram.add_node("b".into(), SyntaxKind::Object, false, &mut sizer);
        assert_eq!(a.to_string(), "1");
        assert_eq!(b.to_string(), "2");
        assert!(diagram.node(b).unwrap().data.is_parent);
        assert_eq!(diagram.node(a).unwrap().data.children_count, 0);
        assert_eq!(diagram.node(b).unwrap().data.children_count, 1);
    }

    #[test]
    fn duplicate_edges_collide_on_id() {
        let mut diagram = Diagram::default();
        let mut sizer = NodeSizer::new();
        let a = diagram.add_node("a".into(), SyntaxKind::Object, false, &mut sizer);
        let b = diagram.add_node("b".into(), SyntaxKind::String, false, &mut sizer);
        diagram.add_edge(a, b);
        diagram.add_edge(a, b);
        assert_eq!(diagram.edges.len(), 1);
        assert_eq!(diagram.edges[0].id, "e1-2");
    }

    #[test]
    fn node_text_serializes_like_the_rendering_surface_expects() {
        let plain = serde_json::to_value(NodeText::Plain("hi".to_string())).unwrap();
        assert_eq!(plain, serde_json::json!("hi"));

        let rows = serde_json::to_value(NodeText::Rows(vec![(
            "a".to_string(),
            "1".to_string(),
        )]))
        .unwrap();
        assert_eq!(rows, serde_json::json!([["a", "1"]]));
    }

    #[test]
    fn node_id_round_trips_as_a_string() {
        let id = NodeId(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"7\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
