/// Mutation type definitions matching Sanity's mutation protocol.
///
/// Only the mutations the translation workflow issues are modelled: creating
/// a new language variant and the advisory `setIfMissing` backfill patch.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::model::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    Create(Document),
    Patch(PatchMutation),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchMutation {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_revision_id: Option<String>,
    #[serde(flatten)]
    pub operations: PatchOperations,
}

impl PatchMutation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            if_revision_id: None,
            operations: PatchOperations::default(),
        }
    }

    /// Set fields only where the document does not have them yet.
    pub fn set_if_missing(mut self, fields: Map<String, Value>) -> Self {
        self.operations
            .set_if_missing
            .get_or_insert_with(Map::new)
            .extend(fields);
        self
    }

    pub fn set(mut self, fields: Map<String, Value>) -> Self {
        self.operations.set.get_or_insert_with(Map::new).extend(fields);
        self
    }

    pub fn unset<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations
            .unset
            .get_or_insert_with(Vec::new)
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Apply the operations to a document in place: `setIfMissing`, then
    /// `set`, then `unset`, the order the content lake uses.
    pub fn apply(&self, document: &mut Map<String, Value>) {
        if let Some(fields) = &self.operations.set_if_missing {
            for (key, value) in fields {
                document.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        if let Some(fields) = &self.operations.set {
            for (key, value) in fields {
                document.insert(key.clone(), value.clone());
            }
        }
        if let Some(fields) = &self.operations.unset {
            for key in fields {
                document.shift_remove(key);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOperations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_if_missing: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unset: Option<Vec<String>>,
}

/// Request body of the `/data/mutate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRequest {
    pub mutations: Vec<Mutation>,
}

/// Result of a mutation transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub transaction_id: String,
    pub results: Vec<MutationResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResult {
    pub id: String,
    #[serde(default)]
    pub operation: Option<String>,
    /// Present when the request asked for `returnDocuments=true`.
    #[serde(default)]
    pub document: Option<Document>,
}
