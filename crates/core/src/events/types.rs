use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the translation engine; the studio reacts to them by
/// reloading its translation list and opening the new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TranslationEvent {
    Created(TranslationCreated),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreationMode {
    Fresh,
    Duplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationCreated {
    pub document_id: String,
    pub document_type: String,
    pub translation_id: String,
    pub language: String,
    pub mode: CreationMode,
    pub timestamp: DateTime<Utc>,
}
