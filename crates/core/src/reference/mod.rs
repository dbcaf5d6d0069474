//! Reference nodes inside schema-less document trees.
//!
//! A node is a reference when it is an object carrying a truthy `_ref`. That
//! duck-typed check lives in [`classify`] and nowhere else; the rest of the
//! crate works with the [`Node`] variants it returns.

pub mod walker;

use serde_json::{Map, Value};

use crate::document::id::DocumentRef;

pub const REF_FIELD: &str = "_ref";
pub const WEAK_FIELD: &str = "_weak";
pub const STRENGTHEN_ON_PUBLISH_FIELD: &str = "_strengthenOnPublish";

/// One node of a document tree, classified.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Reference(Reference<'a>),
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
    Leaf(&'a Value),
}

pub fn classify(value: &Value) -> Node<'_> {
    match value {
        Value::Object(map) if map.get(REF_FIELD).is_some_and(is_truthy) => {
            Node::Reference(Reference { node: map })
        }
        Value::Object(map) => Node::Object(map),
        Value::Array(items) => Node::Array(items),
        leaf => Node::Leaf(leaf),
    }
}

/// JavaScript truthiness, which is what studio data was written against.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Borrowed view of a reference node. Only `_ref` is guaranteed to exist.
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    node: &'a Map<String, Value>,
}

impl<'a> Reference<'a> {
    /// View an object as a reference, if it is one.
    pub fn from_map(node: &'a Map<String, Value>) -> Option<Self> {
        node.get(REF_FIELD)
            .is_some_and(is_truthy)
            .then_some(Self { node })
    }

    /// Target document ID. `None` when `_ref` is truthy but not a string.
    pub fn target(&self) -> Option<&'a str> {
        self.node.get(REF_FIELD).and_then(Value::as_str)
    }

    pub fn target_ref(&self) -> Option<DocumentRef> {
        self.target().map(DocumentRef::parse)
    }

    pub fn is_weak(&self) -> bool {
        self.node.get(WEAK_FIELD).is_some_and(is_truthy)
    }

    /// Set on references to documents created inline that may not exist yet.
    pub fn strengthen_on_publish(&self) -> bool {
        self.node
            .get(STRENGTHEN_ON_PUBLISH_FIELD)
            .is_some_and(is_truthy)
    }

    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_by_truthy_ref() {
        assert!(matches!(classify(&json!({"_ref": "a"})), Node::Reference(_)));
        assert!(matches!(classify(&json!({"_ref": ""})), Node::Object(_)));
        assert!(matches!(classify(&json!({"_ref": null})), Node::Object(_)));
        assert!(matches!(classify(&json!({"_ref": 0})), Node::Object(_)));
        assert!(matches!(classify(&json!([])), Node::Array(_)));
        assert!(matches!(classify(&json!("a")), Node::Leaf(_)));
        assert!(matches!(classify(&json!(null)), Node::Leaf(_)));
    }

    #[test]
    fn non_string_ref_has_no_target() {
        let value = json!({"_ref": 42});
        let Node::Reference(reference) = classify(&value) else {
            panic!("expected a reference");
        };
        assert_eq!(reference.target(), None);
    }

    #[test]
    fn markers_are_read_from_the_node() {
        let value = json!({
            "_ref": "drafts.b",
            "_weak": true,
            "_strengthenOnPublish": {"_type": "page"},
        });
        let Node::Reference(reference) = classify(&value) else {
            panic!("expected a reference");
        };
        assert!(reference.is_weak());
        assert!(reference.strengthen_on_publish());
        assert_eq!(reference.target_ref().unwrap().base_id(), "b");
    }
}
