use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::LanguageInfo;
use crate::document::id::DocumentRef;
use crate::document::model::Document;

/// Outcome of a duplicate request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DuplicateResult {
    Success { document: Document },
    UntranslatedReferencesFound(UntranslatedReferences),
}

impl DuplicateResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DuplicateResult::Success { .. })
    }
}

/// Returned instead of writing anything when a reference target has no
/// member in the requested language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntranslatedReferences {
    pub references: Vec<ReferencedDocument>,
    /// The original with the untranslated references pruned, to be passed
    /// back for "continue without them". `None` when it failed validation.
    pub clean_duplicate: Option<Document>,
    pub language: String,
}

/// Summary of a document some reference points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencedDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type", default, deserialize_with = "null_as_empty")]
    pub doc_type: String,
    #[serde(default)]
    pub translation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
}

impl ReferencedDocument {
    pub fn id_ref(&self) -> DocumentRef {
        DocumentRef::parse(&self.id)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One row of the language switcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationSlot {
    pub language: String,
    pub title: String,
    pub country: Option<String>,
    pub translation: Option<Document>,
}

impl TranslationSlot {
    pub fn new(language: &str, info: &LanguageInfo, translation: Option<Document>) -> Self {
        Self {
            language: language.to_string(),
            title: info.title.clone(),
            country: info.country().map(str::to_string),
            translation,
        }
    }
}
