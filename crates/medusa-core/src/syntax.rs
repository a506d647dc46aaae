//! Boundary to the external JSON parser.
//!
//! The compiler consumes a typed syntax tree, not raw text. `serde_json` (with
//! `preserve_order`, so object keys keep their document order) does the actual
//! parsing; this module reshapes its `Value` into the node kinds the tree
//! walker dispatches on. Properties always have exactly two children: the key
//! node and the value node.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxKind {
    Object,
    Array,
    Property,
    String,
    Number,
    Boolean,
    Null,
}

impl SyntaxKind {
    /// String, number, boolean and null values render as plain node text.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            SyntaxKind::String | SyntaxKind::Number | SyntaxKind::Boolean | SyntaxKind::Null
        )
    }

    pub fn is_container(self) -> bool {
        matches!(self, SyntaxKind::Object | SyntaxKind::Array)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    /// Raw literal text for scalars and property keys (strings unquoted;
    /// numbers/booleans/null as written). `None` for containers and properties.
    pub value: Option<String>,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    fn leaf(kind: SyntaxKind, value: String) -> Self {
        Self {
            kind,
            value: Some(value),
            children: Vec::new(),
        }
    }

    /// The value side of a property node.
    pub fn property_value(&self) -> Option<&SyntaxNode> {
        if self.kind == SyntaxKind::Property {
            self.children.get(1)
        } else {
            None
        }
    }

    /// The JSON literal for a scalar, with strings re-quoted and escaped.
    /// Composite rows store this form so renderers display it verbatim.
    pub fn literal(&self) -> Option<String> {
        let raw = self.value.as_deref()?;
        match self.kind {
            SyntaxKind::String => Some(Value::String(raw.to_string()).to_string()),
            _ => Some(raw.to_string()),
        }
    }
}

/// Parses JSON text into a syntax tree via the external parser.
pub fn parse_syntax_tree(text: &str) -> Result<SyntaxNode> {
    let value: Value = serde_json::from_str(text)?;
    Ok(from_value(&value))
}

fn from_value(value: &Value) -> SyntaxNode {
    match value {
        Value::Null => SyntaxNode::leaf(SyntaxKind::Null, "null".to_string()),
        Value::Bool(b) => SyntaxNode::leaf(SyntaxKind::Boolean, b.to_string()),
        Value::Number(n) => SyntaxNode::leaf(SyntaxKind::Number, n.to_string()),
        Value::String(s) => SyntaxNode::leaf(SyntaxKind::String, s.clone()),
        Value::Array(items) => SyntaxNode {
            kind: SyntaxKind::Array,
            value: None,
            children: items.iter().map(from_value).collect(),
        },
        Value::Object(map) => SyntaxNode {
            kind: SyntaxKind::Object,
            value: None,
            children: map
                .iter()
                .map(|(key, val)| SyntaxNode {
                    kind: SyntaxKind::Property,
                    value: None,
                    children: vec![
                        SyntaxNode::leaf(SyntaxKind::String, key.clone()),
                        from_value(val),
                    ],
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_keep_document_order() {
        let tree = parse_syntax_tree(r#"{"zebra":1,"apple":2,"mango":3}"#).unwrap();
        let keys: Vec<&str> = tree
            .children
            .iter()
            .map(|p| p.children[0].value.as_deref().unwrap())
            .collect();
        assert_eq!(keys, ["zebra", "apple", "mango"]);
    }

    #[test]
    fn property_has_key_and_value_children() {
        let tree = parse_syntax_tree(r#"{"name":"medusa"}"#).unwrap();
        let prop = &tree.children[0];
        assert_eq!(prop.kind, SyntaxKind::Property);
        assert_eq!(prop.children.len(), 2);
        assert_eq!(prop.children[0].value.as_deref(), Some("name"));
        assert_eq!(prop.children[1].kind, SyntaxKind::String);
        assert_eq!(prop.children[1].value.as_deref(), Some("medusa"));
    }

    #[test]
    fn scalar_literals_keep_their_json_form() {
        let tree = parse_syntax_tree(r#"[1.5, true, null, "a\"b"]"#).unwrap();
        let literals: Vec<String> = tree
            .children
            .iter()
            .map(|c| c.literal().unwrap())
            .collect();
        assert_eq!(literals, ["1.5", "true", "null", "\"a\\\"b\""]);
    }

    #[test]
    fn scalar_root_is_a_leaf() {
        let tree = parse_syntax_tree("42").unwrap();
        assert_eq!(tree.kind, SyntaxKind::Number);
        assert_eq!(tree.value.as_deref(), Some("42"));
        assert!(tree.children.is_empty());
    }

    #[test]
    fn invalid_document_is_a_json_error() {
        assert!(parse_syntax_tree("{not json").is_err());
    }
}
