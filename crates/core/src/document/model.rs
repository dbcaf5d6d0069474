use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::DocumentRef;

/// Fields the store owns; never copied onto a duplicate.
pub const SYSTEM_FIELDS: [&str; 4] = ["_id", "_rev", "_createdAt", "_updatedAt"];

pub const LANGUAGE_FIELD: &str = "language";
pub const TRANSLATION_ID_FIELD: &str = "translationId";

/// A content document as read from or written to the content lake.
///
/// Schema-less apart from the reserved `_id`, `_type`, `language` and
/// `translationId` fields, so it stays a plain JSON object underneath.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field("_id")
    }

    pub fn id_ref(&self) -> Option<DocumentRef> {
        self.id().map(DocumentRef::parse)
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.str_field("_type")
    }

    pub fn language(&self) -> Option<&str> {
        self.str_field(LANGUAGE_FIELD)
    }

    pub fn translation_id(&self) -> Option<&str> {
        self.str_field(TRANSLATION_ID_FIELD)
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Copy of the document without `_id`, `_rev` and the timestamps.
    pub fn without_system_fields(&self) -> Self {
        let mut copy = self.clone();
        for field in SYSTEM_FIELDS {
            copy.0.shift_remove(field);
        }
        copy
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_read_reserved_fields() {
        let doc = Document::from_value(json!({
            "_id": "drafts.a",
            "_type": "page",
            "language": "en",
            "translationId": "t1",
            "title": "Home",
        }))
        .unwrap();
        assert_eq!(doc.id(), Some("drafts.a"));
        assert!(doc.id_ref().unwrap().is_draft());
        assert_eq!(doc.doc_type(), Some("page"));
        assert_eq!(doc.language(), Some("en"));
        assert_eq!(doc.translation_id(), Some("t1"));
        assert_eq!(doc.title(), Some("Home"));
    }

    #[test]
    fn non_objects_are_not_documents() {
        assert!(Document::from_value(json!([1, 2])).is_none());
        assert!(Document::from_value(json!("a")).is_none());
    }

    #[test]
    fn system_fields_are_stripped_in_order() {
        let doc = Document::from_value(json!({
            "_id": "a",
            "_rev": "r1",
            "_createdAt": "2024-01-01T00:00:00Z",
            "_updatedAt": "2024-01-02T00:00:00Z",
            "_type": "page",
            "body": "text",
        }))
        .unwrap();
        let stripped = doc.without_system_fields();
        let keys: Vec<_> = stripped.fields().keys().cloned().collect();
        assert_eq!(keys, vec!["_type", "body"]);
    }
}
