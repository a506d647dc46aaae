//! The tree walker: compiles a JSON syntax tree into raw diagram nodes/edges.
//!
//! Sibling scalar properties of one object are not emitted as individual
//! nodes; they accumulate in a buffer and flush into a single composite node
//! per `(parent, array scope)` pair. Array elements are positionally
//! significant and stay one-per-node. The walker leaves orphan bookkeeping and
//! all pruning to the assembler.

use crate::graph::{Diagram, NodeId, NodeText};
use crate::measure::NodeSizer;
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct OpenContainer {
    id: NodeId,
    kind: SyntaxKind,
}

/// A composite node already flushed for a `(parent, array scope)` pair; later
/// flushes for the same pair merge into it instead of creating a sibling.
#[derive(Debug, Clone, Copy)]
struct FlushedSiblings {
    node: NodeId,
    parent: Option<NodeId>,
    array_scope: Option<u32>,
}

/// Traversal state threaded through the recursive walk. Every field the
/// algorithm depends on is named here so merge/flush timing stays auditable.
#[derive(Debug, Default)]
pub(crate) struct WalkState {
    pub(crate) diagram: Diagram,
    /// Property key remembered for the container node about to be created.
    pending_label: Option<String>,
    /// Stack of currently-open container nodes.
    open_containers: Vec<OpenContainer>,
    /// One scope id per array level currently being walked; disambiguates
    /// sibling-buffer flush targets when several arrays share a parent.
    array_scopes: Vec<u32>,
    next_array_scope: u32,
    /// Nodes that ended up with no parent edge; the assembler reattaches them.
    pub(crate) orphans: Vec<NodeId>,
    /// Accumulated `(key, value)` rows waiting to flush into a composite node.
    sibling_rows: Vec<(String, String)>,
    sibling_parent: Option<NodeId>,
    /// Key of the property whose scalar value has not been visited yet.
    pending_key: Option<String>,
    flushed: Vec<FlushedSiblings>,
}

#[derive(Debug, Clone, Copy, Default)]
struct WalkCtx {
    parent_kind: Option<SyntaxKind>,
    parent_id: Option<NodeId>,
    next_kind: Option<SyntaxKind>,
}

fn is_container_kind(kind: Option<SyntaxKind>) -> bool {
    kind.is_some_and(SyntaxKind::is_container)
}

pub(crate) fn walk_document(root: &SyntaxNode, sizer: &mut NodeSizer) -> Result<WalkState> {
    let mut state = WalkState::default();
    visit(&mut state, root, WalkCtx::default(), sizer)?;
    Ok(state)
}

fn visit(state: &mut WalkState, node: &SyntaxNode, ctx: WalkCtx, sizer: &mut NodeSizer) -> Result<()> {
    match node.kind {
        SyntaxKind::Object | SyntaxKind::Array => visit_container(state, node, ctx, sizer),
        SyntaxKind::Property => {
            if node.children.len() != 2 {
                return Err(Error::MalformedSyntaxTree {
                    message: format!(
                        "property node has {} children, expected key and value",
                        node.children.len()
                    ),
                });
            }
            visit_container(state, node, ctx, sizer)
        }
        _ => {
            visit_scalar(state, node, ctx, sizer);
            Ok(())
        }
    }
}

fn visit_scalar(state: &mut WalkState, node: &SyntaxNode, ctx: WalkCtx, sizer: &mut NodeSizer) {
    let Some(raw) = node.value.as_deref() else {
        return;
    };

    // A bare scalar document compiles to a single standalone node.
    if ctx.parent_kind.is_none() {
        state
            .diagram
            .add_node(NodeText::Plain(raw.to_string()), node.kind, false, sizer);
        return;
    }

    match ctx.parent_kind {
        Some(SyntaxKind::Property) if !is_container_kind(ctx.next_kind) => {
            state.sibling_parent = ctx.parent_id;
            if ctx.next_kind.is_none() {
                // value position: pair it with the remembered key
                if let Some(key) = state.pending_key.take() {
                    let literal = node.literal().unwrap_or_else(|| raw.to_string());
                    state.sibling_rows.push((key, literal));
                }
            } else {
                // key position of a scalar-valued property
                state.pending_key = Some(raw.to_string());
            }
        }
        Some(SyntaxKind::Array) => {
            let id = state
                .diagram
                .add_node(NodeText::Plain(raw.to_string()), node.kind, false, sizer);
            if let Some(parent) = ctx.parent_id {
                state.diagram.add_edge(parent, id);
            } else {
                state.orphans.push(id);
            }
        }
        _ => {}
    }

    // key position of a container-valued property: remember the label
    if is_container_kind(ctx.next_kind) && ctx.parent_kind != Some(SyntaxKind::Array) {
        state.pending_label = Some(raw.to_string());
    }
}

fn visit_container(
    state: &mut WalkState,
    node: &SyntaxNode,
    ctx: WalkCtx,
    sizer: &mut NodeSizer,
) -> Result<()> {
    let kind = node.kind;
    let is_document_root = ctx.parent_kind.is_none();
    let mut created: Option<NodeId> = None;

    if kind != SyntaxKind::Property
        && (state.pending_label.is_some() || (is_document_root && kind == SyntaxKind::Array))
    {
        // flush the previous sibling context before opening this container
        state.flush_siblings(sizer);

        let label = state.pending_label.take().unwrap_or_default();
        let id = state
            .diagram
            .add_node(NodeText::Plain(label), kind, false, sizer);
        created = Some(id);
        state.open_containers.push(OpenContainer { id, kind });

        // Inside an array element (or at the document root) the container
        // hangs off the composite node holding its scalar siblings, keeping
        // the property list visually above the nested sub-container. Inside
        // an object it links straight from the object node.
        let scope = state.array_scopes.last().copied();
        let sibling_anchor = state
            .flushed
            .iter()
            .rev()
            .find(|f| f.parent == ctx.parent_id && f.array_scope == scope)
            .map(|f| f.node);
        let enclosing_is_object = state.open_containers.len() >= 2
            && state.open_containers[state.open_containers.len() - 2].kind == SyntaxKind::Object;

        match sibling_anchor {
            Some(anchor) if !enclosing_is_object => state.diagram.add_edge(anchor, id),
            _ => {
                if let Some(parent) = ctx.parent_id {
                    state.diagram.add_edge(parent, id);
                } else {
                    state.orphans.push(id);
                }
            }
        }
    } else if ctx.parent_kind == Some(SyntaxKind::Array) {
        // container element without a node of its own: open a fresh array
        // scope so its flushed siblings stay separate from other elements'
        let scope = state.next_array_scope;
        state.next_array_scope += 1;
        state.array_scopes.push(scope);
    }

    let my_parent_id = state.open_containers.last().map(|c| c.id);

    let mut children: Vec<&SyntaxNode> = node.children.iter().collect();
    if kind == SyntaxKind::Object {
        // scalar-valued properties walk before container-valued ones so the
        // composite property list stays contiguous, independent of key order
        children.sort_by_key(|p| p.property_value().is_some_and(|v| v.kind.is_container()));
    }

    for (index, &child) in children.iter().enumerate() {
        let next_kind = children.get(index + 1).map(|c| c.kind);
        visit(
            state,
            child,
            WalkCtx {
                parent_kind: Some(kind),
                parent_id: my_parent_id,
                next_kind,
            },
            sizer,
        )?;
    }

    if kind != SyntaxKind::Property {
        // flush whatever the last sibling run left behind
        state.flush_siblings(sizer);

        if ctx.parent_kind == Some(SyntaxKind::Array) {
            state.array_scopes.pop();
        } else {
            state.open_containers.pop();
        }

        if let Some(id) = created {
            let count = state.diagram.outgoing(id).count();
            if let Some(container) = state.diagram.node_mut(id) {
                container.data.children_count = count;
            }
        }
    }

    Ok(())
}

impl WalkState {
    /// Flushes the sibling buffer into a composite node: merged into the
    /// existing composite for the same `(parent, array scope)` if one exists,
    /// otherwise a new node linked from the buffer's parent.
    fn flush_siblings(&mut self, sizer: &mut NodeSizer) {
        if self.sibling_rows.is_empty() {
            return;
        }
        let rows = std::mem::take(&mut self.sibling_rows);
        let parent = self.sibling_parent;
        let scope = self.array_scopes.last().copied();

        let existing = self
            .flushed
            .iter()
            .find(|f| f.parent == parent && f.array_scope == scope)
            .map(|f| f.node);

        if let Some(id) = existing {
            if let Some(node) = self.diagram.node_mut(id) {
                if let NodeText::Rows(existing_rows) = &mut node.text {
                    existing_rows.extend(rows);
                } else {
                    node.text = NodeText::Rows(rows);
                }
                let size = sizer.node_size(&node.text, false);
                node.width = size.width;
                node.height = size.height;
            }
        } else {
            let id = self
                .diagram
                .add_node(NodeText::Rows(rows), SyntaxKind::Null, false, sizer);
            if let Some(parent) = parent {
                self.diagram.add_edge(parent, id);
            } else {
                self.orphans.push(id);
            }
            self.flushed.push(FlushedSiblings {
                node: id,
                parent,
                array_scope: scope,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_syntax_tree;

    fn walk(text: &str) -> WalkState {
        let tree = parse_syntax_tree(text).unwrap();
        let mut sizer = NodeSizer::new();
        walk_document(&tree, &mut sizer).unwrap()
    }

    fn node_text(state: &WalkState, index: usize) -> &NodeText {
        &state.diagram.nodes[index].text
    }

    #[test]
    fn scalar_siblings_merge_into_one_composite() {
        let state = walk(r#"{"a":1,"b":"two","c":true}"#);
        assert_eq!(state.diagram.nodes.len(), 1);
        assert_eq!(
            node_text(&state, 0).rows().unwrap(),
            &[
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "\"two\"".to_string()),
                ("c".to_string(), "true".to_string()),
            ]
        );
        assert_eq!(state.orphans.len(), 1);
    }

    #[test]
    fn array_scalars_stay_one_per_node() {
        let state = walk(r#"{"list":[1,2]}"#);
        // container "list" + two standalone elements
        assert_eq!(state.diagram.nodes.len(), 3);
        assert_eq!(node_text(&state, 0).as_plain(), Some("list"));
        assert_eq!(node_text(&state, 1).as_plain(), Some("1"));
        assert_eq!(node_text(&state, 2).as_plain(), Some("2"));
        assert_eq!(state.diagram.edges.len(), 2);
    }

    #[test]
    fn scalars_walk_before_containers_regardless_of_key_order() {
        let state = walk(r#"{"nested":{"x":1},"after":2}"#);
        // "after" is buffered first, so the composite gets id 1 and the
        // nested container hangs off it
        let composite = &state.diagram.nodes[0];
        assert_eq!(
            composite.text.rows().unwrap(),
            &[("after".to_string(), "2".to_string())]
        );
        let container = &state.diagram.nodes[1];
        assert_eq!(container.text.as_plain(), Some("nested"));
        assert_eq!(state.diagram.edges[0].from, composite.id);
        assert_eq!(state.diagram.edges[0].to, container.id);
    }

    #[test]
    fn container_inside_object_links_from_the_object_node() {
        let state = walk(r#"{"outer":{"a":1,"inner":{"b":2}}}"#);
        let outer = state.diagram.nodes[0].id;
        let inner = state
            .diagram
            .nodes
            .iter()
            .find(|n| n.text.as_plain() == Some("inner"))
            .unwrap()
            .id;
        assert!(
            state
                .diagram
                .edges
                .iter()
                .any(|e| e.from == outer && e.to == inner)
        );
    }

    #[test]
    fn array_elements_get_distinct_composites() {
        let state = walk(r#"[{"a":1},{"b":2}]"#);
        // root array container + one composite per element
        assert_eq!(state.diagram.nodes.len(), 3);
        let root = state.diagram.nodes[0].id;
        assert!(state.diagram.nodes[0].data.is_parent);
        assert_eq!(state.diagram.outgoing(root).count(), 2);
        assert_eq!(
            node_text(&state, 1).rows().unwrap(),
            &[("a".to_string(), "1".to_string())]
        );
        assert_eq!(
            node_text(&state, 2).rows().unwrap(),
            &[("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn children_count_is_finalized_on_exit() {
        let state = walk(r#"{"xs":[1,2,3]}"#);
        let xs = state.diagram.nodes[0].clone();
        assert!(xs.data.is_parent);
        assert_eq!(xs.data.children_count, 3);
    }

    #[test]
    fn empty_container_property_keeps_zero_children() {
        let state = walk(r#"{"a":1,"c":{}}"#);
        let c = state
            .diagram
            .nodes
            .iter()
            .find(|n| n.text.as_plain() == Some("c"))
            .unwrap();
        assert!(c.data.is_parent);
        assert_eq!(c.data.children_count, 0);
    }

    #[test]
    fn root_containers_with_no_scalars_become_orphans() {
        let state = walk(r#"{"a":{"x":1},"b":{"y":2}}"#);
        assert_eq!(state.orphans.len(), 2);
    }

    #[test]
    fn bare_scalar_root_is_a_single_node() {
        let state = walk("42");
        assert_eq!(state.diagram.nodes.len(), 1);
        assert_eq!(node_text(&state, 0).as_plain(), Some("42"));
        assert!(state.diagram.edges.is_empty());
    }

    #[test]
    fn malformed_property_is_rejected() {
        let root = SyntaxNode {
            kind: SyntaxKind::Object,
            value: None,
            children: vec![SyntaxNode {
                kind: SyntaxKind::Property,
                value: None,
                children: Vec::new(),
            }],
        };
        let mut sizer = NodeSizer::new();
        assert!(matches!(
            walk_document(&root, &mut sizer),
            Err(Error::MalformedSyntaxTree { .. })
        ));
    }
}
