//! Interaction-layer state: one explicit value owning the compiled diagram
//! and its visibility set, mutated only through reducer-style methods. The
//! compiler itself stays fully decoupled from this store; embedders wire it
//! into whatever subscription mechanism their UI uses.

use crate::graph::{Diagram, DiagramEdge, DiagramNode, NodeId};
use crate::visibility::VisibilitySet;
use crate::{CompileOptions, Engine};

/// Hard ceiling enforced before rendering is attempted; downstream layout
/// cost grows non-linearly with node count.
pub const MAX_NODE_COUNT: usize = 1_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentStatus {
    #[default]
    Empty,
    Ready,
    /// The document compiled but is too large to render.
    OverCapacity,
    ParseFailed,
}

#[derive(Debug, Default)]
pub struct DiagramState {
    diagram: Diagram,
    visibility: VisibilitySet,
    collapse_all: bool,
    focus: Option<NodeId>,
    status: DocumentStatus,
}

impl DiagramState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn visibility(&self) -> &VisibilitySet {
        &self.visibility
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    /// Node to recenter the viewport on after the last collapse-all, if any.
    pub fn focus(&self) -> Option<NodeId> {
        self.focus
    }

    /// Recompiles the document and resets visibility. The sticky collapse-all
    /// mode survives recompilation, mirroring how a user expects the overview
    /// toggle to behave while editing.
    pub fn set_document(&mut self, engine: &mut Engine, text: &str) -> DocumentStatus {
        match engine.compile(text, CompileOptions::strict()) {
            Ok(diagram) if diagram.nodes.len() > MAX_NODE_COUNT => {
                tracing::debug!(nodes = diagram.nodes.len(), "diagram over capacity");
                self.diagram = Diagram::default();
                self.visibility.expand_all();
                self.focus = None;
                self.status = DocumentStatus::OverCapacity;
            }
            Ok(diagram) => {
                self.diagram = diagram;
                self.visibility = VisibilitySet::new();
                self.focus = None;
                if self.collapse_all {
                    self.focus = self.visibility.collapse_all(&self.diagram);
                }
                self.status = DocumentStatus::Ready;
            }
            Err(err) => {
                tracing::warn!(%err, "document failed to compile");
                self.diagram = Diagram::default();
                self.visibility.expand_all();
                self.focus = None;
                self.status = DocumentStatus::ParseFailed;
            }
        }
        self.status
    }

    pub fn clear(&mut self) {
        self.diagram = Diagram::default();
        self.visibility.expand_all();
        self.focus = None;
        self.status = DocumentStatus::Empty;
    }

    pub fn collapse_node(&mut self, id: NodeId) {
        self.visibility.collapse(&self.diagram, id);
    }

    pub fn expand_node(&mut self, id: NodeId) {
        self.visibility.expand(&self.diagram, id);
    }

    /// Toggles the one-level overview. Returns the focus node when turning it
    /// on so the caller can recenter.
    pub fn set_collapse_all(&mut self, on: bool) -> Option<NodeId> {
        self.collapse_all = on;
        if on {
            self.focus = self.visibility.collapse_all(&self.diagram);
        } else {
            self.visibility.expand_all();
            self.focus = None;
        }
        self.focus
    }

    pub fn is_node_hidden(&self, id: NodeId) -> bool {
        self.visibility.is_node_hidden(id)
    }

    pub fn is_edge_hidden(&self, id: &str) -> bool {
        self.visibility.is_edge_hidden(id)
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = &DiagramNode> {
        self.diagram
            .nodes
            .iter()
            .filter(|n| !self.visibility.is_node_hidden(n.id))
    }

    pub fn visible_edges(&self) -> impl Iterator<Item = &DiagramEdge> {
        self.diagram
            .edges
            .iter()
            .filter(|e| !self.visibility.is_edge_hidden(&e.id))
    }

    /// Breadcrumb of a clicked node, for the inspector panel.
    pub fn node_path(&self, id: NodeId) -> Option<&str> {
        self.diagram.node(id).map(|n| n.path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(state: &mut DiagramState, engine: &mut Engine, text: &str) {
        assert_eq!(state.set_document(engine, text), DocumentStatus::Ready);
    }

    #[test]
    fn set_document_resets_visibility() {
        let mut engine = Engine::new();
        let mut state = DiagramState::new();
        ready(&mut state, &mut engine, r#"{"a":{"x":1}}"#);

        let a = state.diagram().nodes[0].id;
        state.collapse_node(a);
        assert!(!state.visibility().is_empty());

        ready(&mut state, &mut engine, r#"{"b":{"y":2}}"#);
        assert!(state.visibility().is_empty());
    }

    #[test]
    fn collapse_all_mode_survives_recompilation() {
        let mut engine = Engine::new();
        let mut state = DiagramState::new();
        ready(&mut state, &mut engine, r#"{"a":{"x":1,"sub":{"y":2}}}"#);

        state.set_collapse_all(true);
        assert!(!state.visibility().is_empty());

        ready(&mut state, &mut engine, r#"{"b":{"z":3,"sub":{"w":4}}}"#);
        assert!(!state.visibility().is_empty());
        assert!(state.focus().is_some());
    }

    #[test]
    fn over_capacity_documents_are_rejected_without_rendering() {
        let mut engine = Engine::new();
        let mut state = DiagramState::new();

        // a root array of 1100 scalars compiles to >1000 nodes
        let mut doc = String::from("[");
        for i in 0..1100 {
            if i > 0 {
                doc.push(',');
            }
            doc.push_str(&i.to_string());
        }
        doc.push(']');

        assert_eq!(
            state.set_document(&mut engine, &doc),
            DocumentStatus::OverCapacity
        );
        assert_eq!(state.visible_nodes().count(), 0);
    }

    #[test]
    fn parse_failure_blanks_the_state() {
        let mut engine = Engine::new();
        let mut state = DiagramState::new();
        ready(&mut state, &mut engine, r#"{"a":1}"#);

        assert_eq!(
            state.set_document(&mut engine, "{broken"),
            DocumentStatus::ParseFailed
        );
        assert!(state.diagram().nodes.is_empty());
    }

    #[test]
    fn node_paths_are_exposed_for_the_inspector() {
        let mut engine = Engine::new();
        let mut state = DiagramState::new();
        ready(&mut state, &mut engine, r#"{"x":{"y":[1,2]}}"#);

        let two = state
            .diagram()
            .nodes
            .iter()
            .find(|n| n.text.as_plain() == Some("2"))
            .unwrap()
            .id;
        assert_eq!(state.node_path(two), Some("{Root}.x.y[1]"));
    }
}
