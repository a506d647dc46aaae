#![forbid(unsafe_code)]

//! JSON-to-diagram graph compiler + subgraph visibility engine (headless).
//!
//! Design goals:
//! - deterministic, testable outputs (compiling the same text twice yields
//!   structurally identical diagrams)
//! - layout-agnostic model (abstract nodes/edges with size estimates; no
//!   positions, arrows, or camera state)
//! - visibility as a separate, pure filter over an immutable diagram
//!
//! ## Example
//!
//! ```
//! use medusa_core::{CompileOptions, Engine};
//!
//! let mut engine = Engine::new();
//! let diagram = engine
//!     .compile(r#"{"name":"medusa","tags":["json","diagram"]}"#, CompileOptions::strict())
//!     .expect("valid document");
//!
//! assert!(diagram.edges.iter().all(|e| {
//!     diagram.node(e.from).is_some() && diagram.node(e.to).is_some()
//! }));
//! ```

mod assemble;
pub mod error;
pub mod graph;
pub mod measure;
pub mod state;
pub mod syntax;
pub mod visibility;
mod walk;

pub use error::{Error, Result};
pub use graph::{Diagram, DiagramEdge, DiagramNode, NodeData, NodeId, NodeText};
pub use measure::{
    DeterministicTextMeasurer, NodeSizer, Size, TextMeasurer, TextMetrics, TextStyle,
};
pub use state::{DiagramState, DocumentStatus, MAX_NODE_COUNT};
pub use syntax::{SyntaxKind, SyntaxNode, parse_syntax_tree};
pub use visibility::{Descendants, VisibilitySet, descendants_of};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub suppress_errors: bool,
}

impl CompileOptions {
    /// Strict compiling (parse errors are returned).
    pub fn strict() -> Self {
        Self {
            suppress_errors: false,
        }
    }

    /// Lenient compiling: on parse failures, return an empty diagram instead
    /// of an error. Callers that need to tell "nothing to render" from
    /// "empty JSON" should use [`CompileOptions::strict`].
    pub fn lenient() -> Self {
        Self {
            suppress_errors: true,
        }
    }
}

/// The compiler entry point. Owns the memoizing size estimator, which is the
/// only state shared between compilations — hence `&mut self`.
#[derive(Debug)]
pub struct Engine {
    sizer: NodeSizer,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            sizer: NodeSizer::new(),
        }
    }

    /// Uses a custom text measurer (e.g. real font metrics) instead of the
    /// deterministic default.
    pub fn with_text_measurer(measurer: Box<dyn TextMeasurer + Send + Sync>) -> Self {
        Self {
            sizer: NodeSizer::with_measurer(measurer),
        }
    }

    /// Compiles JSON text into a diagram.
    pub fn compile(&mut self, text: &str, options: CompileOptions) -> Result<Diagram> {
        let tree = match syntax::parse_syntax_tree(text) {
            Ok(tree) => tree,
            Err(err) => {
                if options.suppress_errors {
                    tracing::warn!(%err, "compile failed; returning empty diagram");
                    return Ok(Diagram::default());
                }
                return Err(err);
            }
        };
        self.compile_tree(&tree, options)
    }

    /// Compiles an already-parsed syntax tree. Useful when the embedder runs
    /// its own JSON parser.
    pub fn compile_tree(&mut self, root: &SyntaxNode, options: CompileOptions) -> Result<Diagram> {
        match assemble::assemble(root, &mut self.sizer) {
            Ok(diagram) => Ok(diagram),
            Err(err) => {
                if options.suppress_errors {
                    tracing::warn!(%err, "assembly failed; returning empty diagram");
                    return Ok(Diagram::default());
                }
                Err(err)
            }
        }
    }
}
